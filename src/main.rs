// src/main.rs

use stepjob::{cli, logging, run};

#[tokio::main]
async fn main() {
    let args = cli::parse();

    if let Err(err) = logging::init_logging(args.log_level, args.quiet) {
        eprintln!("stepjob error: failed to initialise logging: {err:?}");
        std::process::exit(1);
    }

    match run(args).await {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("stepjob error: {err:?}");
            std::process::exit(1);
        }
    }
}
