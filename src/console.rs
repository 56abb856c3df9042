use std::fmt::Write as _;

use crate::api::TranslationApi;
use crate::bulk::{BulkDialog, BulkOutcome};
use crate::executor::{ForwardOutcome, InverseOutcome};
use crate::filters::FilterKey;
use crate::history::UndoId;
use crate::models::{BulkAction, Translation, TranslationId};
use crate::notify::{Notification, NotificationId, NotificationLevel};
use crate::session::{Activation, ReviewSession};

pub const HELP: &str = "\
Commands:
  list                          show the current page
  page N | rows N               change page / rows per page
  approve ID | reject ID        review one translation
  edit ID <source> | <target>   change the texts (status goes back to pending)
  undo [UNDO-ID]                undo the latest or a specific action
  select ID... | unselect ID... change the selection
  select-all | clear            select every visible row / clear the selection
  bulk approve|reject           open the bulk confirmation
  confirm | cancel              answer the bulk confirmation
  filter KEY VALUE              KEY: source target status from to reviewer search
  unfilter KEY | unfilter-all   remove filters
  notes | dismiss N | act N     list, dismiss or activate notifications
  languages | history           reference data / undo history
  help | quit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    List,
    Page(u32),
    Rows(u32),
    Approve(TranslationId),
    Reject(TranslationId),
    Edit {
        id: TranslationId,
        source_text: String,
        target_text: String,
    },
    Undo(Option<UndoId>),
    Select(Vec<TranslationId>),
    Unselect(Vec<TranslationId>),
    SelectAll,
    Clear,
    Bulk(BulkAction),
    Confirm,
    Cancel,
    Filter(FilterKey, String),
    Unfilter(FilterKey),
    UnfilterAll,
    Notes,
    Dismiss(u64),
    Act(u64),
    Languages,
    History,
    Help,
    Quit,
}

fn number<T: std::str::FromStr>(raw: Option<&str>, what: &str) -> Result<T, String> {
    let raw = raw.ok_or_else(|| format!("missing {}", what))?;
    raw.parse()
        .map_err(|_| format!("'{}' is not a valid {}", raw, what))
}

fn ids(rest: &str) -> Result<Vec<TranslationId>, String> {
    let ids: Vec<TranslationId> = rest
        .split_whitespace()
        .map(|raw| number(Some(raw), "id"))
        .collect::<Result<_, _>>()?;
    if ids.is_empty() {
        return Err("expected at least one id".to_string());
    }
    Ok(ids)
}

pub fn parse(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let (word, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let rest = rest.trim();
    let mut args = rest.split_whitespace();

    let command = match word {
        "list" | "ls" => Command::List,
        "page" => Command::Page(number(args.next(), "page")?),
        "rows" => Command::Rows(number(args.next(), "row count")?),
        "approve" => Command::Approve(number(args.next(), "id")?),
        "reject" => Command::Reject(number(args.next(), "id")?),
        "edit" => {
            let id = number(args.next(), "id")?;
            let texts = rest
                .split_once(char::is_whitespace)
                .map(|(_, texts)| texts)
                .unwrap_or("");
            let (source, target) = texts
                .split_once('|')
                .ok_or("usage: edit ID <source> | <target>")?;
            Command::Edit {
                id,
                source_text: source.trim().to_string(),
                target_text: target.trim().to_string(),
            }
        }
        "undo" => match args.next() {
            Some(raw) => Command::Undo(Some(number(Some(raw), "undo id")?)),
            None => Command::Undo(None),
        },
        "select" => Command::Select(ids(rest)?),
        "unselect" => Command::Unselect(ids(rest)?),
        "select-all" => Command::SelectAll,
        "clear" => Command::Clear,
        "bulk" => match args.next() {
            Some("approve") => Command::Bulk(BulkAction::Approve),
            Some("reject") => Command::Bulk(BulkAction::Reject),
            _ => return Err("usage: bulk approve|reject".to_string()),
        },
        "confirm" | "yes" => Command::Confirm,
        "cancel" | "no" => Command::Cancel,
        "filter" => {
            let key: FilterKey = args.next().ok_or("usage: filter KEY VALUE")?.parse()?;
            let value = rest
                .split_once(char::is_whitespace)
                .map(|(_, value)| value.trim())
                .unwrap_or("");
            Command::Filter(key, value.to_string())
        }
        "unfilter" => Command::Unfilter(args.next().ok_or("usage: unfilter KEY")?.parse()?),
        "unfilter-all" => Command::UnfilterAll,
        "notes" => Command::Notes,
        "dismiss" => Command::Dismiss(number(args.next(), "notification number")?),
        "act" => Command::Act(number(args.next(), "notification number")?),
        "languages" => Command::Languages,
        "history" => Command::History,
        "help" | "?" => Command::Help,
        "quit" | "exit" => Command::Quit,
        "" => return Err("empty command".to_string()),
        other => return Err(format!("unknown command '{}' (try 'help')", other)),
    };
    Ok(command)
}

pub fn render_rows(rows: &[Translation], selected: &[TranslationId]) -> String {
    if rows.is_empty() {
        return "No translations found.".to_string();
    }
    let mut out = String::new();
    for row in rows {
        let mark = if selected.contains(&row.id) { "[x]" } else { "[ ]" };
        let _ = writeln!(
            out,
            "{} #{:<5} {:<9} {} -> {}: {} => {}",
            mark,
            row.id,
            row.status.as_str(),
            row.source_language.iso_code,
            row.target_language.iso_code,
            row.source_text,
            row.target_text
        );
    }
    out.trim_end().to_string()
}

pub fn render_notification(note: &Notification) -> String {
    let level = match note.level {
        NotificationLevel::Success => "ok",
        NotificationLevel::Error => "error",
        NotificationLevel::Info => "info",
        NotificationLevel::Warning => "warn",
    };
    let mut line = format!("({}) [{}] {}", note.id, level, note.title);
    if let Some(detail) = &note.detail {
        let _ = write!(line, ": {}", detail);
    }
    if note.undo_available() {
        line.push_str("  [act: undo]");
    } else if note.retry.is_some() {
        line.push_str("  [act: retry]");
    }
    line
}

fn describe_forward(outcome: &ForwardOutcome) -> String {
    match outcome {
        ForwardOutcome::Applied { undo_id, updated } => {
            format!("#{} is now {} ({})", updated.id, updated.status, undo_id)
        }
        ForwardOutcome::Failed(e) => format!("failed: {}", e.detail()),
        ForwardOutcome::Discarded => "discarded".to_string(),
    }
}

fn describe_inverse(outcome: &InverseOutcome) -> String {
    match outcome {
        InverseOutcome::NotFound => "nothing to undo".to_string(),
        InverseOutcome::Reverted(row) => format!("#{} restored to {}", row.id, row.status),
        InverseOutcome::Failed(e) => format!("undo failed: {}", e.detail()),
        InverseOutcome::Discarded => "discarded".to_string(),
    }
}

/// Result of running one command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Output(String),
    Quit,
}

pub async fn execute<A: TranslationApi>(session: &ReviewSession<A>, command: Command) -> Reply {
    let out = match command {
        Command::List => {
            let rows = session.rows();
            format!(
                "Page {} ({} per page, {} total)\n{}",
                session.page(),
                session.rows_per_page(),
                session.total(),
                render_rows(&rows, &session.selected_ids())
            )
        }
        Command::Page(page) => {
            session.set_page(page).await;
            format!("page {}", session.page())
        }
        Command::Rows(rows) => {
            session.set_rows_per_page(rows).await;
            format!("{} rows per page", session.rows_per_page())
        }
        Command::Approve(id) => describe_forward(&session.approve(id).await),
        Command::Reject(id) => describe_forward(&session.reject(id).await),
        Command::Edit {
            id,
            source_text,
            target_text,
        } => describe_forward(&session.edit(id, &source_text, &target_text).await),
        Command::Undo(Some(id)) => describe_inverse(&session.undo(id).await),
        Command::Undo(None) => describe_inverse(&session.undo_last().await),
        Command::Select(ids) => {
            for id in ids {
                session.select_row(id, true);
            }
            format!("{} selected", session.selected_ids().len())
        }
        Command::Unselect(ids) => {
            for id in ids {
                session.select_row(id, false);
            }
            format!("{} selected", session.selected_ids().len())
        }
        Command::SelectAll => {
            session.select_all(true);
            format!("{} selected", session.selected_ids().len())
        }
        Command::Clear => {
            session.clear_selection();
            "selection cleared".to_string()
        }
        Command::Bulk(action) => {
            let count = session.selected_ids().len();
            if count == 0 {
                "select some translations first".to_string()
            } else if match action {
                BulkAction::Approve => session.handle_bulk_approve(),
                BulkAction::Reject => session.handle_bulk_reject(),
            } {
                format!("{} {} translations? (confirm / cancel)", action.verb(), count)
            } else {
                "a bulk update is already running".to_string()
            }
        }
        Command::Confirm => match session.handle_bulk_confirm().await {
            BulkOutcome::NothingToDo => match session.bulk_state() {
                BulkDialog::Idle => "nothing to confirm".to_string(),
                _ => "no translations selected".to_string(),
            },
            BulkOutcome::Busy => "a bulk update is already running".to_string(),
            BulkOutcome::TransportFailed(e) => format!("bulk update failed: {}", e.detail()),
            BulkOutcome::Completed(result) => format!(
                "{} {}, {} failed",
                result.succeeded_ids.len(),
                result.action.past_tense(),
                result.failed_ids.len()
            ),
            BulkOutcome::Discarded => "discarded".to_string(),
        },
        Command::Cancel => {
            if session.handle_bulk_dialog_close() {
                "cancelled".to_string()
            } else {
                "nothing to cancel".to_string()
            }
        }
        Command::Filter(key, value) => match session.set_filter(key, &value) {
            Ok(()) => format!("filter {} = '{}'", key, value),
            Err(e) => e.detail(),
        },
        Command::Unfilter(key) => {
            session.remove_filter(key).await;
            format!("filter {} removed", key)
        }
        Command::UnfilterAll => {
            session.clear_filters().await;
            "filters cleared".to_string()
        }
        Command::Notes => {
            let notes = session.notifications();
            if notes.is_empty() {
                "no notifications".to_string()
            } else {
                notes
                    .iter()
                    .map(render_notification)
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Dismiss(raw) => {
            if session.dismiss(NotificationId::from_raw(raw)) {
                "dismissed".to_string()
            } else {
                "no such notification".to_string()
            }
        }
        Command::Act(raw) => match session.activate(NotificationId::from_raw(raw)).await {
            Activation::Nothing => "nothing to do".to_string(),
            Activation::Undone(outcome) => describe_inverse(&outcome),
            Activation::Retried(outcome) => describe_forward(&outcome),
            Activation::BulkReopened(action) => {
                format!("{} selected translations again? (confirm / cancel)", action.verb())
            }
            Activation::Reloaded(ok) => {
                if ok { "reloaded".to_string() } else { "reload failed".to_string() }
            }
        },
        Command::Languages => match session.languages().await {
            Ok(languages) => languages
                .iter()
                .map(|l| format!("{:>3} {} ({})", l.id, l.name, l.iso_code))
                .collect::<Vec<_>>()
                .join("\n"),
            Err(e) => e.detail(),
        },
        Command::History => {
            let entries = session.history();
            if entries.is_empty() {
                "undo history is empty".to_string()
            } else {
                entries
                    .iter()
                    .map(|e| format!("{} {}", e.id, e.description))
                    .collect::<Vec<_>>()
                    .join("\n")
            }
        }
        Command::Help => HELP.to_string(),
        Command::Quit => return Reply::Quit,
    };
    Reply::Output(out)
}
