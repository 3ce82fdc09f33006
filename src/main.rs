use bootfetch::bootstrap::{Bootstrap, BootstrapError, Launch};
use bootfetch::config::{self, Config};
use bootfetch::env::EnvSnapshot;
use bootfetch::observability;
use std::ffi::OsString;
use std::process::ExitCode;
use tracing::info;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let env = config::capture_environment();
    observability::init_tracing(&env);

    // Everything after argv[0] belongs to the downstream process
    let args: Vec<OsString> = std::env::args_os().skip(1).collect();

    let launch = match prepare(args, &env).await {
        Ok(launch) => launch,
        Err(error) => return fail(&error),
    };

    info!(program = launch.program(), "Handing over to downstream process");
    let error = BootstrapError::from(launch.exec());
    fail(&error)
}

async fn prepare(args: Vec<OsString>, env: &EnvSnapshot) -> Result<Launch, BootstrapError> {
    let config = Config::load(env)?;
    let bootstrap = Bootstrap::new(config, env)?;
    let prepared = bootstrap.prepare(args, env).await?;
    Ok(prepared.launch)
}

fn fail(error: &BootstrapError) -> ExitCode {
    eprintln!("bootfetch: {error}");
    ExitCode::FAILURE
}
