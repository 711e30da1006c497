#[macro_use]
extern crate clap;

use {
    anyhow::{Context, Result},
    fixed_grid::{open_dataset, Dataset, ReaderOptions},
    log::{error, info},
    simplelog::{Config as LogConfig, LevelFilter, TermLogger, TerminalMode},
    std::path::Path,
};

#[quit::main]
fn main() {
    let matches = clap_app!(fixed_grid =>
        (version: crate_version!())
        (about: "Reads Clawpack fgout and fgmax fixed grid output into labeled datasets.")
        (@arg FILE: +required "fgout frame (fgout<NNNN>.b<MMMM> or .q<MMMM>) or fgmax file (fgmax<NNNN>.txt)")
        (@arg CONFIG: -c --config +takes_value "Path to a YAML file containing reader options.")
        (@arg RUN_DIR: -r --("run-dir") +takes_value "Directory containing fgout_grids.data or fgmax_grids.data.")
        (@arg EPSG: -e --epsg +takes_value "EPSG code of the coordinate reference system.")
        (@arg DROP: -d --drop +takes_value +multiple number_of_values(1) "Variable to leave out of the dataset.")
        (@arg OUTPUT: -o --output +takes_value "Write the dataset to this path in bincode format.")
        (@arg SUMMARY: -s --summary "Print a YAML summary of the dataset.")
        (@arg VERBOSE: -v --verbose "Log debugging information.")
    )
    .get_matches();

    TermLogger::init(
        if matches.is_present("VERBOSE") {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        },
        LogConfig::default(),
        TerminalMode::Mixed,
    )
    .expect("Failed to initialize logger");

    let options = {
        let mut options = match matches.value_of("CONFIG") {
            Some(path) => ReaderOptions::from_file(path).unwrap_or_else(|e| {
                error!("Failed to load reader options from {}: \"{}\"", path, e);
                quit::with_code(1);
            }),
            None => ReaderOptions::default(),
        };

        if let Some(dir) = matches.value_of("RUN_DIR") {
            options.run_dir = Some(dir.into());
        }

        if let Some(epsg) = matches.value_of("EPSG") {
            options.epsg = Some(epsg.parse().unwrap_or_else(|e| {
                error!("Invalid EPSG code {:?}: \"{}\"", epsg, e);
                quit::with_code(1);
            }));
        }

        if let Some(names) = matches.values_of("DROP") {
            options.drop_variables.extend(names.map(str::to_owned));
        }

        options
    };

    // Should never panic as clap should return an error if the argument was not supplied
    let path = matches.value_of("FILE").expect("Input file not supplied");

    let dataset = open_dataset(path, &options).unwrap_or_else(|e| {
        error!("Failed to open {}: \"{}\"", path, e);
        quit::with_code(1);
    });

    info!(
        "Read {} with dimensions {:?} and variables {:?}",
        path,
        dataset.dims,
        dataset.data_vars.keys().collect::<Vec<_>>()
    );

    write_outputs(&dataset, matches.value_of("OUTPUT"), matches.is_present("SUMMARY"))
        .unwrap_or_else(|e| {
            error!("Error: \"{:#}\"", e);
            quit::with_code(1);
        });
}

fn write_outputs(dataset: &Dataset, output: Option<&str>, summary: bool) -> Result<()> {
    if let Some(output) = output {
        dataset
            .write_bincode(Path::new(output))
            .with_context(|| format!("Failed to write dataset to {}", output))?;
        info!("Wrote dataset to {}", output);
    }

    if summary {
        let stdout = std::io::stdout();
        serde_yaml::to_writer(stdout.lock(), &dataset.summary())
            .context("Failed to write dataset summary")?;
        println!();
    }

    Ok(())
}
