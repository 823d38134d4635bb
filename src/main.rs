use anyhow::Result;
use clap::{App, AppSettings, Arg, SubCommand};
use spacetraveling::build::build_site;
use spacetraveling::config::{Config, Overrides};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let matches = App::new("spacetraveling")
        .about("Builds the blog from its Prismic repository")
        .version(env!("CARGO_PKG_VERSION"))
        .setting(AppSettings::SubcommandRequiredElseHelp)
        .subcommand(
            SubCommand::with_name("build")
                .about("Renders the listing and post pages")
                .arg(
                    Arg::with_name("project")
                        .long("project")
                        .short("p")
                        .takes_value(true)
                        .default_value(".")
                        .help("The project directory (or any directory below it)"),
                )
                .arg(
                    Arg::with_name("output")
                        .long("output")
                        .short("o")
                        .takes_value(true)
                        .default_value("./_output")
                        .help("The directory the site is written to"),
                )
                .arg(
                    Arg::with_name("access-token")
                        .long("access-token")
                        .takes_value(true)
                        .env("PRISMIC_ACCESS_TOKEN")
                        .hide_env_values(true)
                        .help("The Prismic access token for private repositories"),
                )
                .arg(
                    Arg::with_name("ref")
                        .long("ref")
                        .takes_value(true)
                        .help("Builds a preview of this content release instead of the master ref"),
                ),
        )
        .get_matches();

    if let Some(matches) = matches.subcommand_matches("build") {
        // Canonicalized so the project file search can walk real ancestors.
        let project = std::fs::canonicalize(matches.value_of("project").unwrap_or("."))?;
        let output = PathBuf::from(matches.value_of("output").unwrap_or("./_output"));
        let config = Config::from_directory(
            &project,
            &output,
            Overrides {
                access_token: matches.value_of("access-token").map(str::to_owned),
                preview_ref: matches.value_of("ref").map(str::to_owned),
            },
        )?;
        build_site(&config)?;
        info!(output = %output.display(), "site built");
    }
    Ok(())
}
