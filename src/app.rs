use log::{debug, info, warn};

use poll_store::builder::PollBuilder;
use poll_store::scoring::{read_meter, MeterCategory, ScoringError};
use poll_store::*;
use snafu::prelude::*;

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use rand::Rng;

use crate::app::admin::AdminGate;
use crate::app::config_reader::*;
use crate::app::identity::resolve_user;
use crate::args::{Args, Command};

pub mod admin;
pub mod config_reader;
pub mod identity;
pub mod render;

#[derive(Debug, Snafu)]
pub enum AppError {
    #[snafu(display("Could not open the configuration file {}", path.display()))]
    OpeningConfig { source: io::Error, path: PathBuf },

    #[snafu(display("Could not read the configuration file {}", path.display()))]
    ParsingConfig {
        source: serde_json::Error,
        path: PathBuf,
    },

    #[snafu(display("Could not open the storage"))]
    OpeningStorage { source: StorageError },

    #[snafu(display("Could not store the user identity"))]
    SavingIdentity { source: StorageError },

    #[snafu(display("The poll operation failed"))]
    Store { source: PollStoreError },

    #[snafu(display("Admin access denied: {reason}"))]
    AdminDenied { reason: String },

    #[snafu(display("Unknown meter category {name:?} (see the categories command)"))]
    UnknownCategory { name: String },

    #[snafu(display("Could not read the meter"))]
    Meter { source: ScoringError },

    #[snafu(display("The {what} numbers start at 1"))]
    ZeroIndex { what: String },

    #[snafu(display("Could not encode the output"))]
    EncodingOutput { source: serde_json::Error },

    #[snafu(display("Could not write the output"))]
    Output { source: io::Error },
}

pub type AppResult<T> = Result<T, AppError>;

fn from_one(what: &str, n: usize) -> AppResult<usize> {
    n.checked_sub(1).context(ZeroIndexSnafu { what })
}

fn emit(out: &mut impl Write, text: &str) -> AppResult<()> {
    out.write_all(text.as_bytes()).context(OutputSnafu {})
}

fn emit_js(out: &mut impl Write, js: &serde_json::Value) -> AppResult<()> {
    let pretty = serde_json::to_string_pretty(js).context(EncodingOutputSnafu {})?;
    emit(out, &pretty)?;
    emit(out, "\n")
}

/// Runs one command against a store. All the output goes to `out`.
pub fn run_command<S: KeyValueStore, R: Rng>(
    store: &mut PollStore<S>,
    settings: &Settings,
    command: &Command,
    rng: &mut R,
    out: &mut impl Write,
) -> AppResult<()> {
    debug!("run_command: {:?}", command);
    let gate = AdminGate::new(&settings.admin_password);
    match command {
        Command::List { json } => {
            let user = resolve_user(store.storage_mut(), settings.user_id.as_deref())?;
            let polls = store.list_polls();
            let now = Utc::now();
            if *json {
                let l: Vec<serde_json::Value> = polls
                    .iter()
                    .map(|p| render::poll_js(p, store.voted_option(&user, &p.id), now))
                    .collect();
                emit_js(out, &serde_json::Value::Array(l))
            } else if polls.is_empty() {
                emit(out, "No polls yet.\n")
            } else {
                for p in polls.iter() {
                    let line = render::poll_line(p, store.voted_option(&user, &p.id), now);
                    emit(out, &line)?;
                    emit(out, "\n")?;
                }
                Ok(())
            }
        }
        Command::Show { id, json } => {
            let user = resolve_user(store.storage_mut(), settings.user_id.as_deref())?;
            let voted = store.voted_option(&user, id);
            if *json {
                let results = store.results(id).context(StoreSnafu {})?;
                emit_js(out, &render::results_js(&results, voted))
            } else {
                let poll = store
                    .get_poll(id)
                    .ok_or_else(|| PollStoreError::NotFound { id: id.clone() })
                    .context(StoreSnafu {})?;
                emit(out, &render::breakdown(&poll, voted))
            }
        }
        Command::Vote { id, option } => {
            let user = resolve_user(store.storage_mut(), settings.user_id.as_deref())?;
            let idx = from_one("option", *option)?;
            let poll = store.cast_vote(&user, id, idx).context(StoreSnafu {})?;
            emit(out, &render::breakdown(&poll, Some(idx)))?;
            emit(out, "🎉 ধন্যবাদ! Your vote has been counted.\n")
        }
        Command::Create {
            title,
            options,
            category,
            description,
            duration,
            admin,
        } => {
            gate.authorize(admin.password.as_deref())?;
            let mut builder = PollBuilder::new(title)
                .category(category.as_deref().unwrap_or(settings.default_category.as_str()))
                .duration_days(duration.unwrap_or(settings.default_duration_days))
                .options(options)
                .context(StoreSnafu {})?;
            if let Some(d) = description {
                builder = builder.description(d);
            }
            let draft = builder.build().context(StoreSnafu {})?;
            let poll = store.create_poll(&draft).context(StoreSnafu {})?;
            emit(out, &format!("Created poll {}\n", poll.id))?;
            emit(out, &render::breakdown(&poll, None))
        }
        Command::Update {
            id,
            title,
            options,
            category,
            description,
            duration,
            admin,
        } => {
            gate.authorize(admin.password.as_deref())?;
            let patch = PollPatch {
                title: title.clone(),
                description: description.clone(),
                category: category.clone(),
                options: if options.is_empty() {
                    None
                } else {
                    Some(options.clone())
                },
                duration: *duration,
            };
            let poll = store.update_poll(id, &patch).context(StoreSnafu {})?;
            emit(out, &format!("Updated poll {}\n", poll.id))?;
            emit(out, &render::breakdown(&poll, None))
        }
        Command::Delete { id, admin } => {
            gate.authorize(admin.password.as_deref())?;
            let removed = store.delete_poll(id).context(StoreSnafu {})?;
            emit(
                out,
                &format!("Deleted poll {} ({})\n", removed.id, removed.title),
            )
        }
        Command::Categories => emit(out, &render::categories()),
        Command::Score {
            category,
            answers,
            names,
        } => {
            let cat = MeterCategory::parse(category).context(UnknownCategorySnafu {
                name: category.as_str(),
            })?;
            if answers.is_empty() {
                return emit(out, &render::questionnaire(cat));
            }
            let answers = answers
                .iter()
                .map(|a| from_one("answer", *a))
                .collect::<AppResult<Vec<usize>>>()?;
            let names = match names.as_deref() {
                Some([a, b]) => Some((a.as_str(), b.as_str())),
                _ => None,
            };
            let reading = read_meter(cat, names, &answers, rng).context(MeterSnafu {})?;
            info!("score: {} -> {}", cat, reading.score);
            emit(out, &render::meter_reading(&reading))
        }
    }
}

pub fn run(args: &Args) -> AppResult<()> {
    let settings = load_settings(args)?;
    info!("Using storage {}", settings.storage_path.display());
    let storage = FileStorage::open(&settings.storage_path).context(OpeningStorageSnafu {})?;
    let mut store = PollStore::new(storage);
    let mut rng = rand::thread_rng();
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let res = run_command(&mut store, &settings, &args.command, &mut rng, &mut out);
    if let Err(e) = &res {
        warn!("Command failed: {:?}", e);
    }
    res
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::args::AdminArgs;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn settings() -> Settings {
        Settings {
            storage_path: PathBuf::from("unused.json"),
            admin_password: "pw".to_string(),
            user_id: Some("tester".to_string()),
            default_category: DEFAULT_CATEGORY.to_string(),
            default_duration_days: DEFAULT_DURATION_DAYS,
        }
    }

    fn admin(password: Option<&str>) -> AdminArgs {
        AdminArgs {
            password: password.map(|p| p.to_string()),
        }
    }

    fn run_on<S: KeyValueStore>(
        store: &mut PollStore<S>,
        settings: &Settings,
        command: Command,
    ) -> AppResult<String> {
        let mut rng = StdRng::seed_from_u64(7);
        let mut out: Vec<u8> = Vec::new();
        run_command(store, settings, &command, &mut rng, &mut out)?;
        Ok(String::from_utf8(out).unwrap())
    }

    fn create(title: &str, options: &[&str], password: Option<&str>) -> Command {
        Command::Create {
            title: title.to_string(),
            options: options.iter().map(|s| s.to_string()).collect(),
            category: None,
            description: None,
            duration: None,
            admin: admin(password),
        }
    }

    #[test]
    fn vote_is_one_based_and_once() {
        let mut store = PollStore::new(MemoryStorage::new());
        let s = settings();
        let out = run_on(
            &mut store,
            &s,
            Command::Vote {
                id: "poll2".to_string(),
                option: 3,
            },
        )
        .unwrap();
        assert!(out.contains("ধন্যবাদ"));
        assert_eq!(store.voted_option("tester", "poll2"), Some(2));
        assert_eq!(store.get_poll("poll2").unwrap().options[2].votes, 431);

        let again = run_on(
            &mut store,
            &s,
            Command::Vote {
                id: "poll2".to_string(),
                option: 1,
            },
        );
        assert!(matches!(
            again,
            Err(AppError::Store {
                source: PollStoreError::AlreadyVoted { .. }
            })
        ));
        let zero = run_on(
            &mut store,
            &s,
            Command::Vote {
                id: "poll1".to_string(),
                option: 0,
            },
        );
        assert!(matches!(zero, Err(AppError::ZeroIndex { .. })));
    }

    #[test]
    fn admin_commands_need_the_password() {
        let mut store = PollStore::new(MemoryStorage::new());
        let s = settings();
        for password in [None, Some("wrong")] {
            let res = run_on(&mut store, &s, create("T", &["A", "B"], password));
            assert!(matches!(res, Err(AppError::AdminDenied { .. })));
            let res = run_on(
                &mut store,
                &s,
                Command::Delete {
                    id: "poll1".to_string(),
                    admin: admin(password),
                },
            );
            assert!(matches!(res, Err(AppError::AdminDenied { .. })));
        }
        // Nothing was read or written.
        assert!(store.storage().is_empty());
    }

    #[test]
    fn create_update_delete() {
        let mut store = PollStore::new(MemoryStorage::new());
        let s = settings();
        run_on(&mut store, &s, create("Tea?", &["Yes", "No"], Some("pw"))).unwrap();
        let poll = store.list_polls().remove(0);
        assert_eq!(poll.title, "Tea?");
        assert_eq!(poll.category, DEFAULT_CATEGORY);
        assert_eq!(poll.duration, DEFAULT_DURATION_DAYS);

        run_on(
            &mut store,
            &s,
            Command::Update {
                id: poll.id.clone(),
                title: None,
                options: vec![],
                category: Some("সমাজ".to_string()),
                description: None,
                duration: Some(2),
                admin: admin(Some("pw")),
            },
        )
        .unwrap();
        let updated = store.get_poll(&poll.id).unwrap();
        assert_eq!(updated.category, "সমাজ");
        assert_eq!(updated.duration, 2);
        assert_eq!(updated.options, poll.options);

        let out = run_on(
            &mut store,
            &s,
            Command::Delete {
                id: poll.id.clone(),
                admin: admin(Some("pw")),
            },
        )
        .unwrap();
        assert!(out.contains("Deleted"));
        assert!(store.get_poll(&poll.id).is_none());
    }

    #[test]
    fn list_as_json() {
        let mut store = PollStore::new(MemoryStorage::new());
        let s = settings();
        store.cast_vote("tester", "poll1", 1).unwrap();
        let out = run_on(&mut store, &s, Command::List { json: true }).unwrap();
        let js: serde_json::Value = serde_json::from_str(&out).unwrap();
        let l = js.as_array().unwrap();
        assert_eq!(l.len(), 2);
        assert_eq!(l[0]["poll"]["id"], "poll1");
        assert_eq!(l[0]["votedOption"], 1);
        assert!(l[1]["votedOption"].is_null());
    }

    #[test]
    fn list_survives_an_unrepresentable_end() {
        let far = Poll {
            id: "far".to_string(),
            title: "Forever?".to_string(),
            description: None,
            category: DEFAULT_CATEGORY.to_string(),
            options: vec![PollOption::new("Yes"), PollOption::new("No")],
            created_at: Utc::now().timestamp_millis(),
            duration: 100_000_000,
        };
        let mut storage = MemoryStorage::new();
        storage
            .set(POLLS_KEY, &serde_json::to_string(&[far]).unwrap())
            .unwrap();
        let mut store = PollStore::new(storage);
        let s = settings();
        let out = run_on(&mut store, &s, Command::List { json: false }).unwrap();
        assert!(out.contains("far"));
        assert!(out.contains("open"));
        let out = run_on(&mut store, &s, Command::List { json: true }).unwrap();
        let js: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(js[0]["active"], true);
    }

    #[test]
    fn show_unknown_poll() {
        let mut store = PollStore::new(MemoryStorage::new());
        let res = run_on(
            &mut store,
            &settings(),
            Command::Show {
                id: "nope".to_string(),
                json: false,
            },
        );
        assert!(matches!(
            res,
            Err(AppError::Store {
                source: PollStoreError::NotFound { .. }
            })
        ));
    }

    #[test]
    fn score_checks_category_and_names() {
        let mut store = PollStore::new(MemoryStorage::new());
        let s = settings();
        let score = |category: &str, names: Option<Vec<String>>| Command::Score {
            category: category.to_string(),
            answers: vec![3, 3, 3],
            names,
        };
        assert!(matches!(
            run_on(&mut store, &s, score("astrology", None)),
            Err(AppError::UnknownCategory { .. })
        ));
        assert!(matches!(
            run_on(&mut store, &s, score("love", None)),
            Err(AppError::Meter {
                source: ScoringError::MissingNames { .. }
            })
        ));
        let out = run_on(
            &mut store,
            &s,
            score("love", Some(vec!["Rina".to_string(), "Tom".to_string()])),
        )
        .unwrap();
        // All the highest answers always reach 100.
        assert!(out.starts_with("Rina & Tom: "));
        assert!(out.contains("100%"));

        let questions = run_on(
            &mut store,
            &s,
            Command::Score {
                category: "mood".to_string(),
                answers: vec![],
                names: None,
            },
        )
        .unwrap();
        assert!(questions.contains("Q3."));
    }

    #[test]
    fn runs_against_a_storage_file() {
        let dir = tempfile::tempdir().unwrap();
        let s = Settings {
            storage_path: dir.path().join("store.json"),
            user_id: None,
            ..settings()
        };
        let mut store = PollStore::new(FileStorage::open(&s.storage_path).unwrap());
        run_on(
            &mut store,
            &s,
            Command::Vote {
                id: "poll1".to_string(),
                option: 1,
            },
        )
        .unwrap();

        let mut reopened = PollStore::new(FileStorage::open(&s.storage_path).unwrap());
        let user = resolve_user(reopened.storage_mut(), None).unwrap();
        assert_eq!(reopened.voted_option(&user, "poll1"), Some(0));
        assert_eq!(reopened.get_poll("poll1").unwrap().options[0].votes, 431);
    }
}
