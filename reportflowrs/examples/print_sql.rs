use std::{env, fs, path::PathBuf};

use reportflow::{
    config::ReportflowConfig,
    dialect::AnsiDialect,
    load_registry,
    pagination::Pagination,
    query_builder::{QueryBuilder, QueryOptions},
    ReportRequest,
};

fn usage() {
    eprintln!("Usage: print_sql <definitions_dir> <request_json>");
    eprintln!("Example: cargo run --example print_sql -- demos/definitions demos/requests/sales.json");
}

fn main() -> anyhow::Result<()> {
    let mut args = env::args().skip(1).collect::<Vec<_>>();
    if args.len() < 2 {
        usage();
        std::process::exit(1);
    }

    let definitions_dir = PathBuf::from(args.remove(0));
    let request_path = PathBuf::from(args.remove(0));

    reportflow::init_tracing();
    let registry = load_registry(definitions_dir)?;
    let request: ReportRequest = serde_json::from_str(&fs::read_to_string(request_path)?)?;
    let report_id = request
        .report_id
        .ok_or_else(|| anyhow::anyhow!("request has no report_id"))?;
    let definition = registry
        .get_report(report_id)
        .ok_or_else(|| anyhow::anyhow!("unknown report {report_id}"))?;

    let config = ReportflowConfig::load_default().for_report(&definition.name);
    let pagination =
        Pagination::from_request(request.limit, request.offset, config.pagination.page_size);
    let query = QueryBuilder::new(&AnsiDialect, QueryOptions::from(&config)).build(
        definition,
        &registry,
        &request.filters,
        pagination,
    )?;

    println!("{}", query.complete_query());
    println!("-- count");
    println!("{}", query.count_query());
    for (idx, param) in query.params().iter().enumerate() {
        println!("-- ${} = {}", idx + 1, serde_json::to_string(param)?);
    }
    Ok(())
}
