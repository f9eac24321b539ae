use clap::{Parser, Subcommand};

/// Community polls with one vote per user, and a playful feeling meter.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON configuration file. See the manual of the poll_store crate
    /// for the accepted keys.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) Where polls and ballots are kept. Setting this option overrides the path
    /// that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub storage: Option<String>,

    /// The identity to vote as. By default, an anonymous identity is generated on first use
    /// and kept in the storage file.
    #[clap(short, long, value_parser)]
    pub user: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Command {
    /// Lists all the polls, most recent first.
    List {
        #[clap(long, takes_value = false)]
        json: bool,
    },
    /// Shows the result breakdown of one poll.
    Show {
        #[clap(value_parser)]
        id: String,
        #[clap(long, takes_value = false)]
        json: bool,
    },
    /// Votes on a poll. Each user may vote only once per poll.
    Vote {
        #[clap(value_parser)]
        id: String,
        /// The option to vote for, starting at 1.
        #[clap(value_parser)]
        option: usize,
    },
    /// (admin) Creates a new poll.
    Create {
        #[clap(long, value_parser)]
        title: String,
        /// One option of the poll. Repeat for each option (2 to 5).
        #[clap(long = "option", value_parser)]
        options: Vec<String>,
        #[clap(long, value_parser)]
        category: Option<String>,
        #[clap(long, value_parser)]
        description: Option<String>,
        /// (days) How long the poll is advertised as open.
        #[clap(long, value_parser)]
        duration: Option<u32>,
        #[clap(flatten)]
        admin: AdminArgs,
    },
    /// (admin) Edits a poll. Options whose text is unchanged keep their votes.
    Update {
        #[clap(value_parser)]
        id: String,
        #[clap(long, value_parser)]
        title: Option<String>,
        /// Replaces all the options. Repeat for each option (2 to 5).
        #[clap(long = "option", value_parser)]
        options: Vec<String>,
        #[clap(long, value_parser)]
        category: Option<String>,
        #[clap(long, value_parser)]
        description: Option<String>,
        #[clap(long, value_parser)]
        duration: Option<u32>,
        #[clap(flatten)]
        admin: AdminArgs,
    },
    /// (admin) Deletes a poll for good.
    Delete {
        #[clap(value_parser)]
        id: String,
        #[clap(flatten)]
        admin: AdminArgs,
    },
    /// Lists the feeling meter categories and the suggested poll categories.
    Categories,
    /// Runs the feeling meter on a set of answers.
    Score {
        /// The meter category (for example love, mood or foodie).
        #[clap(value_parser)]
        category: String,
        /// The chosen option of each question, starting at 1. Repeat for each question.
        #[clap(long = "answer", value_parser)]
        answers: Vec<usize>,
        /// The two names, for the love and friendship meters.
        #[clap(long, number_of_values = 2, value_parser)]
        names: Option<Vec<String>>,
    },
}

#[derive(clap::Args, Debug, Clone, PartialEq)]
pub struct AdminArgs {
    /// The admin password.
    #[clap(long, env = "FEELMETER_ADMIN_PASSWORD", value_parser)]
    pub password: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_vote() {
        let args = Args::parse_from(["feelmeter", "--user", "u1", "vote", "poll1", "2"]);
        assert_eq!(args.user.as_deref(), Some("u1"));
        assert_eq!(
            args.command,
            Command::Vote {
                id: "poll1".to_string(),
                option: 2
            }
        );
    }

    #[test]
    fn parses_repeated_options_and_names() {
        let args = Args::parse_from([
            "feelmeter", "create", "--title", "T", "--option", "A", "--option", "B",
            "--password", "pw",
        ]);
        match args.command {
            Command::Create { options, admin, .. } => {
                assert_eq!(options, vec!["A", "B"]);
                assert_eq!(admin.password.as_deref(), Some("pw"));
            }
            c => panic!("unexpected command {:?}", c),
        }

        let args = Args::parse_from([
            "feelmeter", "score", "love", "--answer", "1", "--answer", "3", "--answer", "2",
            "--names", "Rina", "Tom",
        ]);
        match args.command {
            Command::Score { answers, names, .. } => {
                assert_eq!(answers, vec![1, 3, 2]);
                assert_eq!(names, Some(vec!["Rina".to_string(), "Tom".to_string()]));
            }
            c => panic!("unexpected command {:?}", c),
        }
    }
}
