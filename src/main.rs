use job_launcher::{Base64, Environment, ExitCode, Job, Spec, launch};

fn main() {
    init_tracing();
    let args: Vec<String> = std::env::args().collect();
    let code = match run(&args) {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            1
        }
    };
    std::process::exit(code);
}

/// Parse → decode → assemble → launch, reporting the child's exit code.
fn run(args: &[String]) -> anyhow::Result<ExitCode> {
    let spec = Spec::from_args(args)?;
    tracing::debug!(
        version = spec.version,
        num_chunks = spec.num_chunks,
        sha256sum = %spec.sha256sum,
        "parsed job spec"
    );

    let job = Job::from_spec(&spec, &Base64::new())?;
    tracing::info!(executable = %job.executable, args = ?job.args, "launching job");

    let env = Environment::capture();
    let code = launch(job, &env)?;
    tracing::info!(code, "job finished");
    Ok(code)
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}
