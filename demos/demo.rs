use csvql::builder::{Over, QueryBuilder, col, lit};
use csvql::format::{self, OutputFormat};
use csvql::{Database, Result};

const EMPLOYEES: &str = "\
id,name,dept,salary,hired
1,Alice,eng,120000,2019-04-01
2,Bob,eng,95000,2021-09-15
3,Carol,ops,70000,2018-01-20
4,Dan,ops,72000,2022-06-30
5,Eve,sales,64000,
";

fn main() -> Result<()> {
    println!("CSV SQL Engine Demo\n");

    let dir = std::env::temp_dir().join("csvql-demo");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("employees.csv");
    std::fs::write(&path, EMPLOYEES)?;
    let source = path.display().to_string();
    println!("Wrote {source}\n");

    let db = Database::new();
    let mut stdout = std::io::stdout();

    println!("Salary by department:");
    let by_dept = db.query(&format!(
        "SELECT dept, COUNT(*) AS headcount, AVG(salary) AS average \
         FROM '{source}' GROUP BY dept ORDER BY average DESC"
    ))?;
    format::write_table(&mut stdout, &by_dept, OutputFormat::Table, b',')?;

    println!("\nRank within department (built without SQL text):");
    let ranked = QueryBuilder::new()
        .select(&["name", "dept", "salary"])
        .rank(
            Over {
                partition_by: &["dept"],
                order_by: &[("salary", true)],
            },
            Some("rank"),
        )
        .from(&source)
        .filter(col("hired").is_not_null())
        .order_by("dept", false)
        .order_by("rank", false);
    println!("  {}", ranked.clone().to_sql()?);
    let ranked = ranked.execute(&db)?;
    format::write_table(&mut stdout, &ranked, OutputFormat::Markdown, b',')?;

    println!("\nHired after 2020 as JSON:");
    let recent = db.query(&format!(
        "SELECT name, YEAR(hired) AS year FROM '{source}' WHERE hired >= DATE '2020-01-01'"
    ))?;
    format::write_table(&mut stdout, &recent, OutputFormat::Json, b',')?;

    let out = dir.join("high_earners.csv");
    let created = db.query(&format!(
        "CREATE TABLE '{}' AS SELECT name, salary FROM '{source}' WHERE salary > {}",
        out.display(),
        80000
    ))?;
    println!(
        "\nCREATE TABLE wrote {} rows to {}",
        created.get_int(0, 1),
        out.display()
    );

    let unmatched = QueryBuilder::new()
        .from(&source)
        .where_eq("dept", "marketing")
        .or_filter(col("salary").lt(lit(0)))
        .execute(&db)?;
    println!("Rows in marketing or with negative salary: {}", unmatched.row_count());

    Ok(())
}
