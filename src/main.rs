use anyhow::{bail, Result};
use dicegame_warehouse::{
    cli::{Cli, Commands},
    config::Settings,
    filter::resolve_tables,
    pipeline::{self, RunOptions},
    schema::{SOURCE_TABLES, WAREHOUSE_TABLES},
    ui::{TracingUi, UiApp},
};
use std::time::Instant;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();
}

fn main() -> Result<()> {
    let cli = Cli::parse_args();

    match cli.command {
        Commands::Run {
            input_dir,
            output,
            sqlite,
            include,
            exclude,
            tui,
            fail_on_quality,
        } => {
            // Log lines would corrupt the dashboard
            if !tui {
                init_tracing();
            }

            let start = Instant::now();
            let settings = Settings::load(cli.config.as_deref())?;
            let options = RunOptions {
                input_dir,
                output_dir: output.unwrap_or_else(|| settings.output.dir.clone()),
                sqlite,
                tables: resolve_tables(include, exclude)?,
            };

            let outcome = if tui {
                let mut ui = UiApp::new()?;
                match pipeline::run(&options, &settings, &mut ui) {
                    Ok(outcome) => {
                        ui.finish(&outcome.checked.summary())?;
                        outcome
                    }
                    Err(e) => {
                        ui.restore()?;
                        return Err(e);
                    }
                }
            } else {
                pipeline::run(&options, &settings, &mut TracingUi::new())?
            };

            info!(
                "Wrote {:?} in {:.1}s",
                options.output_dir,
                start.elapsed().as_secs_f64()
            );
            println!("{}", outcome.checked.summary());

            if fail_on_quality && !outcome.checked.quality.passed {
                bail!(
                    "Quality check failed with score {:.1}",
                    outcome.checked.quality.score
                );
            }
        }

        Commands::Check { input_dir } => {
            init_tracing();
            let settings = Settings::load(cli.config.as_deref())?;
            let checked = pipeline::check(&input_dir, &settings, &mut TracingUi::new())?;

            println!("{}", checked.load.summary());
            println!("{}", checked.summary());

            if !checked.quality.passed {
                bail!("Quality check failed with score {:.1}", checked.quality.score);
            }
        }

        Commands::ListTables => {
            println!("Source tables:\n");
            for table in SOURCE_TABLES {
                println!("  {:<24} key ({})", table.name, table.primary_key.join(", "));
            }
            println!("\nWarehouse tables:\n");
            for table in WAREHOUSE_TABLES {
                println!("  {:<24} key ({})", table.name, table.primary_key.join(", "));
            }
        }
    }

    Ok(())
}
