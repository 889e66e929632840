use clap::{Parser, Subcommand};

/// Imports per-department election results into a relational store.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    #[clap(subcommand)]
    pub command: Command,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Creates the tables of the store.
    Init {
        /// (file path) The SQLite database. It is created if it does not exist.
        #[clap(short, long, value_parser)]
        database: String,
        /// Drops all the tables before creating them again. All data is lost.
        #[clap(long, takes_value = false)]
        reset: bool,
    },
    /// Runs the import jobs of a configuration file.
    Import {
        /// (file path) The JSON import configuration. The paths it contains are relative to
        /// the directory of this file.
        #[clap(short, long, value_parser)]
        config: String,
        /// (layout identifier, optional) If specified, only the jobs using this layout are run.
        #[clap(long, value_parser)]
        only: Option<String>,
    },
    /// Writes every table of the store as a csv file.
    Export {
        /// (file path) The SQLite database.
        #[clap(short, long, value_parser)]
        database: String,
        /// (directory) Where the csv files are written. It is created if needed.
        #[clap(short, long, value_parser)]
        out: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_import() {
        let args = Args::parse_from([
            "elecimport",
            "import",
            "--config",
            "conf.json",
            "--only",
            "presidential-2012",
            "--verbose",
        ]);
        assert!(args.verbose);
        match args.command {
            Command::Import { config, only } => {
                assert_eq!(config, "conf.json");
                assert_eq!(only.as_deref(), Some("presidential-2012"));
            }
            x => panic!("unexpected command {:?}", x),
        }
    }

    #[test]
    fn parse_init() {
        let args = Args::parse_from(["elecimport", "init", "-d", "e.db", "--reset"]);
        assert!(!args.verbose);
        assert!(matches!(args.command, Command::Init { reset: true, .. }));
    }
}
