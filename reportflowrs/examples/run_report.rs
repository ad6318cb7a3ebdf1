use std::{fs, path::Path, sync::Arc};

use reportflow::{
    load_registry, run_report, CancellationFlag, ConnectionManager, DuckDbConnection,
    MappingRegistry, ReportRequest, ReportflowConfig,
};

fn bootstrap_duckdb(path: &Path) -> anyhow::Result<()> {
    let conn = duckdb::Connection::open(path)?;
    conn.execute_batch(
        "
        CREATE TABLE C_DocType (
            C_DocType_ID INTEGER PRIMARY KEY,
            Name VARCHAR
        );
        CREATE TABLE C_DocType_Trl (
            C_DocType_ID INTEGER,
            AD_Language VARCHAR,
            Name VARCHAR
        );
        CREATE TABLE C_Order (
            C_Order_ID INTEGER PRIMARY KEY,
            C_DocType_ID INTEGER,
            Region VARCHAR,
            SalesRep VARCHAR,
            Amount DOUBLE
        );
        INSERT INTO C_DocType VALUES
            (132, 'Standard Order'),
            (133, 'POS Order');
        INSERT INTO C_DocType_Trl VALUES
            (132, 'es_MX', 'Orden Estándar');
        INSERT INTO C_Order VALUES
            (1, 132, 'EU', 'Alice', 100.0),
            (2, 133, 'EU', 'Bob', 50.0),
            (3, 132, 'US', 'Carl', 30.0),
            (4, NULL, NULL, 'Dana', 12.5);
        ",
    )?;
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    reportflow::init_tracing();
    let db_path = Path::new("demos/demo.duckdb");
    if db_path.exists() {
        fs::remove_file(db_path)?;
    }
    bootstrap_duckdb(db_path)?;

    let config = ReportflowConfig::from_file("demos/reportflow.toml")?;
    let backend = DuckDbConnection::with_config(db_path, &config.defaults.duckdb);
    let mut connections = ConnectionManager::with_config(config);
    connections.insert("default", Arc::new(backend));

    let registry = load_registry("demos/definitions")?;
    let request: ReportRequest =
        serde_json::from_str(&fs::read_to_string("demos/requests/sales.json")?)?;

    let output = run_report(
        &registry,
        &connections,
        &MappingRegistry::new(),
        &request,
        &CancellationFlag::new(),
    )
    .await?;
    println!(
        "records: {} of {}",
        output.info.record_count(),
        output.total_count
    );
    println!("{}", serde_json::to_string_pretty(&output.to_json())?);
    Ok(())
}
