//! Command-line client for the Spellbook API.

use clap::{Args, CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{generate, Shell};
use spellbook_client::config::API_URL_ENV;
use spellbook_client::{
    resolve_endpoint, ClientError, ClientStore, HttpSpellApi, Notice, NoticeLevel, NoticeSink,
    Selection, SortOrder, SyncOrchestrator,
};
use spellbook_core::models::{Element, Rarity, Spell, SpellDraft, TrashEntry};
use spellbook_core::DEFAULT_LIST_LIMIT;
use std::io::{self, BufRead, Write};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "spellbook", about = "Spellbook CLI", version)]
struct Cli {
    /// Server URL (can also be set via SPELLBOOK_API_URL)
    #[arg(short, long, env = API_URL_ENV)]
    server: Option<String>,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    json: bool,

    /// Request timeout in seconds
    #[arg(short = 't', long, default_value = "30")]
    timeout: u64,

    /// Records fetched per list request
    #[arg(long, default_value_t = DEFAULT_LIST_LIMIT)]
    page_size: usize,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum SortArg {
    Asc,
    Desc,
}

impl From<SortArg> for SortOrder {
    fn from(value: SortArg) -> Self {
        match value {
            SortArg::Asc => SortOrder::Asc,
            SortArg::Desc => SortOrder::Desc,
        }
    }
}

fn parse_element(value: &str) -> Result<Element, String> {
    Element::from_name(value).ok_or_else(|| {
        let names: Vec<&str> = Element::ALL.iter().map(|e| e.as_str()).collect();
        format!("expected one of {}", names.join(", "))
    })
}

fn parse_rarity(value: &str) -> Result<Rarity, String> {
    Rarity::from_name(value).ok_or_else(|| {
        let names: Vec<&str> = Rarity::ALL.iter().map(|r| r.as_str()).collect();
        format!("expected one of {}", names.join(", "))
    })
}

#[derive(Args, Debug, Default)]
struct SpellFields {
    #[arg(short, long)]
    name: Option<String>,
    #[arg(short, long, value_parser = parse_element)]
    element: Option<Element>,
    #[arg(short, long, value_parser = parse_rarity)]
    rarity: Option<Rarity>,
    #[arg(short, long)]
    mana_cost: Option<u32>,
    #[arg(short, long)]
    cooldown_sec: Option<u32>,
    #[arg(short, long)]
    description: Option<String>,
    /// Ingredient (repeatable); replaces the existing list
    #[arg(short, long = "ingredient")]
    ingredients: Vec<String>,
    /// Remove every ingredient
    #[arg(long, conflicts_with = "ingredients")]
    clear_ingredients: bool,
}

impl SpellFields {
    fn apply(self, draft: &mut SpellDraft) {
        if let Some(name) = self.name {
            draft.name = name;
        }
        if let Some(element) = self.element {
            draft.element = element;
        }
        if let Some(rarity) = self.rarity {
            draft.rarity = rarity;
        }
        if let Some(mana_cost) = self.mana_cost {
            draft.mana_cost = mana_cost;
        }
        if let Some(cooldown_sec) = self.cooldown_sec {
            draft.cooldown_sec = cooldown_sec;
        }
        if let Some(description) = self.description {
            draft.description = description;
        }
        if self.clear_ingredients {
            draft.ingredients.clear();
        } else if !self.ingredients.is_empty() {
            draft.ingredients = self.ingredients;
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
    #[command(flatten)]
    Spells(SpellCommand),
}

/// Subcommands that talk to the API.
#[derive(Subcommand)]
enum SpellCommand {
    /// List spells newest-first, or filtered and sorted by name
    List {
        /// Keep loading pages until every spell is loaded
        #[arg(short, long)]
        all: bool,
        /// Case-insensitive match on name, description, or element
        #[arg(short, long)]
        query: Option<String>,
        /// Sort loaded spells by name
        #[arg(long, value_enum)]
        sort: Option<SortArg>,
    },
    Get {
        id: String,
    },
    New {
        #[command(flatten)]
        fields: SpellFields,
    },
    Edit {
        id: String,
        #[command(flatten)]
        fields: SpellFields,
    },
    /// Move a spell to the trash
    Delete {
        id: String,
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
    /// List trashed spells
    Trash,
    /// Move a spell back out of the trash
    Restore {
        id: String,
    },
}

fn encode_json<T: serde::Serialize + ?Sized>(value: &T) -> Result<String, String> {
    serde_json::to_string_pretty(value).map_err(|err| format!("response encoding error: {}", err))
}

fn spell_row(spell: &Spell) -> String {
    format!(
        "{:<36} {:<28} {:<8} {:<9} {:>5}",
        spell.id,
        spell.name,
        spell.element.as_str(),
        spell.rarity.as_str(),
        spell.mana_cost
    )
}

fn format_spell_rows(spells: &[Spell], json: bool) -> Result<String, String> {
    if json {
        return encode_json(spells);
    }
    Ok(spells.iter().map(spell_row).collect::<Vec<_>>().join("\n"))
}

fn format_spell_detail(spell: &Spell, json: bool) -> Result<String, String> {
    if json {
        return encode_json(spell);
    }
    let mut lines = vec![
        format!("{} ({}, {})", spell.name, spell.element, spell.rarity),
        format!("id:          {}", spell.id),
        format!("mana cost:   {}", spell.mana_cost),
        format!("cooldown:    {}s", spell.cooldown_sec),
    ];
    if !spell.ingredients.is_empty() {
        lines.push(format!("ingredients: {}", spell.ingredients.join(", ")));
    }
    lines.push(format!("created:     {}", spell.created_at.to_rfc3339()));
    lines.push(format!("updated:     {}", spell.updated_at.to_rfc3339()));
    if !spell.description.is_empty() {
        lines.push(String::new());
        lines.push(spell.description.clone());
    }
    Ok(lines.join("\n"))
}

fn format_trash_rows(entries: &[TrashEntry], json: bool) -> Result<String, String> {
    if json {
        return encode_json(entries);
    }
    Ok(entries
        .iter()
        .map(|entry| {
            format!(
                "{}  deleted {}",
                spell_row(&entry.spell),
                entry.deleted_at.to_rfc3339()
            )
        })
        .collect::<Vec<_>>()
        .join("\n"))
}

fn print_or_exit(action: &str, output: Result<String, String>) {
    match output {
        Ok(output) if output.is_empty() => {}
        Ok(output) => println!("{}", output),
        Err(message) => {
            eprintln!("{} failed: {}", action, message);
            std::process::exit(1);
        }
    }
}

/// Unwrap an orchestrator result; failures were already reported as notices.
fn or_exit<T>(result: Result<T, ClientError>) -> T {
    match result {
        Ok(value) => value,
        Err(_) => std::process::exit(1),
    }
}

fn stderr_notices() -> NoticeSink {
    Arc::new(|notice: &Notice| match notice.level {
        NoticeLevel::Info => eprintln!("{}", notice.message),
        NoticeLevel::Error => eprintln!("error: {}", notice.message),
    })
}

fn confirm_on_stdin(id: &str) -> bool {
    eprint!("Move spell {} to trash? [y/N] ", id);
    if io::stderr().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "spellbook=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let Cli {
        server,
        json,
        timeout,
        page_size,
        command,
    } = Cli::parse();

    let command = match command {
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            return Ok(());
        }
        Commands::Spells(command) => command,
    };

    let endpoint = resolve_endpoint(server, |key| std::env::var(key).ok())?;
    let api = HttpSpellApi::new(endpoint.base_url(), Duration::from_secs(timeout))?;
    tracing::debug!("Using API at {} ({:?})", api.base_url(), endpoint);

    let store = Arc::new(Mutex::new(ClientStore::new()));
    let sync = SyncOrchestrator::new(api, store)
        .with_notices(stderr_notices())
        .with_page_size(page_size);

    match command {
        SpellCommand::List { all, query, sort } => {
            or_exit(sync.refresh().await);
            while all && sync.snapshot().has_more() {
                or_exit(sync.load_more().await);
            }

            let filtered = query.is_some() || sort.is_some();
            let state = {
                let store = sync.store();
                let mut store = store.lock().unwrap_or_else(|p| p.into_inner());
                if let Some(query) = query {
                    store.set_search_query(query);
                }
                if let Some(sort) = sort {
                    store.set_sort_order(sort.into());
                }
                store.state().clone()
            };
            let spells = if filtered {
                state.filtered_and_sorted()
            } else {
                state.spells.clone()
            };
            print_or_exit("List", format_spell_rows(&spells, json));
            if !json && state.has_more() {
                eprintln!(
                    "Showing {} of {} (use --all to load everything)",
                    state.offset, state.total
                );
            }
        }
        SpellCommand::Get { id } => {
            if let Some(spell) = or_exit(sync.open_spell(&id).await) {
                print_or_exit("Get", format_spell_detail(&spell, json));
            }
        }
        SpellCommand::New { fields } => {
            sync.new_spell();
            let mut draft = SpellDraft::default();
            fields.apply(&mut draft);
            if let Some(spell) = or_exit(sync.save(draft).await) {
                print_or_exit("New", format_spell_detail(&spell, json));
            }
        }
        SpellCommand::Edit { id, fields } => {
            or_exit(sync.open_spell(&id).await);
            let mut draft = match sync.snapshot().selection {
                Some(selection @ Selection::Existing(_)) => selection.draft(),
                _ => anyhow::bail!("Spell {} could not be loaded for editing", id),
            };
            fields.apply(&mut draft);
            if let Some(spell) = or_exit(sync.save(draft).await) {
                print_or_exit("Edit", format_spell_detail(&spell, json));
            }
        }
        SpellCommand::Delete { id, yes } => {
            let deleted = or_exit(sync.delete_spell(&id, |id| yes || confirm_on_stdin(id)).await);
            if !deleted {
                eprintln!("Delete cancelled");
            }
        }
        SpellCommand::Trash => {
            or_exit(sync.load_trash().await);
            print_or_exit("Trash", format_trash_rows(&sync.snapshot().trash, json));
        }
        SpellCommand::Restore { id } => {
            if let Some(spell) = or_exit(sync.restore_spell(&id).await) {
                print_or_exit("Restore", format_spell_detail(&spell, json));
            }
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{
        format_spell_detail, format_spell_rows, format_trash_rows, Cli, Commands, SortArg,
        SpellCommand,
    };
    use chrono::{TimeZone, Utc};
    use clap::Parser;
    use spellbook_core::models::{Element, Rarity, Spell, SpellDraft, TrashEntry};

    fn frost_bolt() -> Spell {
        let at = Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).single().expect("time");
        Spell {
            id: "abc123".to_string(),
            name: "Frost Bolt".to_string(),
            element: Element::Frost,
            rarity: Rarity::Common,
            mana_cost: 5,
            cooldown_sec: 2,
            description: "A shard of ice.".to_string(),
            ingredients: vec!["ice crystal".to_string()],
            created_at: at,
            updated_at: at,
        }
    }

    #[test]
    fn cli_parses_new_with_case_insensitive_enums() {
        let cli = Cli::try_parse_from([
            "spellbook",
            "new",
            "--name",
            "Frost Bolt",
            "--element",
            "frost",
            "--rarity",
            "MYTHIC",
            "--mana-cost",
            "10",
            "-i",
            "ice",
            "-i",
            "ink",
        ])
        .expect("cli should parse new");
        let Commands::Spells(SpellCommand::New { fields }) = cli.command else {
            panic!("expected new command");
        };
        let mut draft = SpellDraft::default();
        fields.apply(&mut draft);
        assert_eq!(draft.name, "Frost Bolt");
        assert_eq!(draft.element, Element::Frost);
        assert_eq!(draft.rarity, Rarity::Mythic);
        assert_eq!(draft.mana_cost, 10);
        assert_eq!(draft.ingredients, vec!["ice", "ink"]);
    }

    #[test]
    fn cli_rejects_unknown_element() {
        assert!(Cli::try_parse_from(["spellbook", "new", "--element", "Shadow"]).is_err());
    }

    #[test]
    fn edit_fields_only_override_what_was_given() {
        let cli = Cli::try_parse_from(["spellbook", "edit", "abc123", "--clear-ingredients"])
            .expect("cli should parse edit");
        let Commands::Spells(SpellCommand::Edit { id, fields }) = cli.command else {
            panic!("expected edit command");
        };
        assert_eq!(id, "abc123");
        let mut draft = SpellDraft::from(&frost_bolt());
        fields.apply(&mut draft);
        assert_eq!(draft.name, "Frost Bolt");
        assert_eq!(draft.mana_cost, 5);
        assert!(draft.ingredients.is_empty());
    }

    #[test]
    fn completions_stay_apart_from_api_commands() {
        let cli = Cli::try_parse_from(["spellbook", "completions", "bash"])
            .expect("cli should parse completions");
        assert!(matches!(cli.command, Commands::Completions { .. }));

        let cli = Cli::try_parse_from(["spellbook", "trash"]).expect("cli should parse trash");
        assert!(matches!(cli.command, Commands::Spells(SpellCommand::Trash)));
    }

    #[test]
    fn cli_parses_list_filters() {
        let cli = Cli::try_parse_from(["spellbook", "list", "--all", "-q", "ice", "--sort", "desc"])
            .expect("cli should parse list");
        match cli.command {
            Commands::Spells(SpellCommand::List { all, query, sort }) => {
                assert!(all);
                assert_eq!(query.as_deref(), Some("ice"));
                assert_eq!(sort, Some(SortArg::Desc));
            }
            _ => panic!("expected list command"),
        }
    }

    #[test]
    fn text_output_helpers_render_key_fields() {
        let spell = frost_bolt();
        let rows = format_spell_rows(std::slice::from_ref(&spell), false).expect("rows");
        assert!(rows.starts_with("abc123"));
        assert!(rows.contains("Frost Bolt"));
        assert!(rows.contains("Frost"));

        let detail = format_spell_detail(&spell, false).expect("detail");
        assert!(detail.starts_with("Frost Bolt (Frost, Common)"));
        assert!(detail.contains("ingredients: ice crystal"));
        assert!(detail.ends_with("A shard of ice."));
    }

    #[test]
    fn json_output_helpers_preserve_payload_shape() {
        let spell = frost_bolt();
        let entry = TrashEntry {
            spell: spell.clone(),
            deleted_at: spell.created_at,
        };

        let rendered = format_spell_rows(std::slice::from_ref(&spell), true).expect("rows");
        let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(parsed[0]["manaCost"], 5);

        let rendered = format_trash_rows(&[entry], true).expect("trash");
        let parsed: serde_json::Value = serde_json::from_str(&rendered).expect("valid json");
        assert_eq!(parsed[0]["id"], "abc123");
        assert!(parsed[0]["deletedAt"].is_string());
    }
}
