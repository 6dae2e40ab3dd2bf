use uuid::Uuid;

use crate::activity::{activity_entry, FeedQuery};
use crate::config::Config;
use crate::entity::{EntityBase, EntityKind, Problem, QuantifierFormat, User, VoteTarget};
use crate::error::{IdeastormError, Result};
use crate::permission::{authorize, ensure, visible_filter, Mode, Target};
use crate::scoring::{aggregate_quantifiers, tally, QuantifierTotal, ScoreTable};
use crate::storage::SqliteStore;

use super::handlers::{label, open_project, parse_kind};

fn problem_flags(problem: &Problem) -> String {
    let mut flags = Vec::new();
    if !problem.public {
        flags.push("private");
    }
    if !problem.open {
        flags.push("closed");
    }
    if !problem.published {
        flags.push("draft");
    }
    if problem.locked {
        flags.push("locked");
    }
    if flags.is_empty() {
        String::new()
    } else {
        format!(" [{}]", flags.join(", "))
    }
}

pub fn handle_list(
    as_user: Option<String>,
    entity_type: String,
    problem: Option<String>,
    deleted: bool,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let kind = parse_kind(&entity_type)?;

    // (json, text lines, owning problem title)
    let (output, lines, scope): (String, Vec<String>, String) = match kind {
        EntityKind::Problem => {
            let items = store.list_problems(&visible_filter(&user, kind))?;
            let lines = items
                .iter()
                .map(|p| {
                    format!(
                        "  {}{} ({} criteria, {} ideas)",
                        label(&p.base),
                        problem_flags(p),
                        p.criteria_count,
                        p.idea_count
                    )
                })
                .collect();
            (serde_json::to_string_pretty(&items)?, lines, "the project".to_string())
        }
        _ => {
            let problem = problem.ok_or_else(|| {
                IdeastormError::InvalidArgument(format!("listing {} needs --problem", kind))
            })?;
            let problem = store.find_problem(&problem)?;
            ensure(&user, Mode::View, &Target::Problem(&problem))?;
            let (output, lines) = list_children(&store, kind, &problem.base.id, deleted)?;
            (output, lines, format!("'{}'", problem.base.title))
        }
    };

    if json {
        println!("{}", output);
    } else if lines.is_empty() {
        println!("No {} found in {}.", kind, scope);
    } else {
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}

fn list_children(
    store: &SqliteStore,
    kind: EntityKind,
    problem_id: &Uuid,
    deleted: bool,
) -> Result<(String, Vec<String>)> {
    match kind {
        EntityKind::Criteria => {
            let items = store.list_criteria(problem_id)?;
            let lines = items
                .iter()
                .map(|c| format!("  {} [{}, {} {}]", label(&c.base), c.format, c.result, c.order))
                .collect();
            Ok((serde_json::to_string_pretty(&items)?, lines))
        }
        EntityKind::Idea => {
            let items = store.list_ideas(problem_id, deleted)?;
            let mut lines = Vec::with_capacity(items.len());
            for idea in &items {
                let score = tally(&store.votes_for(&VoteTarget::Idea(idea.base.id))?);
                let marker = if idea.is_deleted() { " [deleted]" } else { "" };
                lines.push(format!("  {} (score {}){}", label(&idea.base), score, marker));
            }
            Ok((serde_json::to_string_pretty(&items)?, lines))
        }
        EntityKind::Alternative => {
            let items = store.list_alternatives(problem_id)?;
            let lines = items
                .iter()
                .map(|a| format!("  {} ({} ideas)", label(&a.base), a.idea_ids.len()))
                .collect();
            Ok((serde_json::to_string_pretty(&items)?, lines))
        }
        EntityKind::Comment => {
            let items = store.list_comments(problem_id)?;
            let mut lines = Vec::with_capacity(items.len());
            for c in &items {
                lines.push(format!(
                    "  {:03} {} on {}: {}",
                    c.base.sequence_number,
                    store.username(c.base.author)?,
                    c.target.kind(),
                    c.text()
                ));
            }
            Ok((serde_json::to_string_pretty(&items)?, lines))
        }
        EntityKind::Problem => Err(IdeastormError::InvalidEntityType(
            "problems have no owning problem".to_string(),
        )),
    }
}

/// Resolve an entity for reading and check the user may view it.
/// Returns the entity's base fields.
fn viewable(store: &SqliteStore, user: &User, kind: EntityKind, id: &str) -> Result<EntityBase> {
    match kind {
        EntityKind::Problem => {
            let problem = store.find_problem(id)?;
            ensure(user, Mode::View, &Target::Problem(&problem))?;
            Ok(problem.base)
        }
        EntityKind::Criteria => {
            let criteria = store.find_criteria(id)?;
            let problem = store.problem(&criteria.problem_id)?;
            ensure(
                user,
                Mode::View,
                &Target::Criteria {
                    problem: &problem,
                    criteria: Some(&criteria),
                },
            )?;
            Ok(criteria.base)
        }
        EntityKind::Idea => {
            let idea = store.find_idea(id)?;
            let problem = store.problem(&idea.problem_id)?;
            ensure(
                user,
                Mode::View,
                &Target::Idea {
                    problem: &problem,
                    idea: Some(&idea),
                },
            )?;
            Ok(idea.base)
        }
        EntityKind::Alternative => {
            let alternative = store.find_alternative(id)?;
            let problem = store.problem(&alternative.problem_id)?;
            ensure(
                user,
                Mode::View,
                &Target::Alternative {
                    problem: &problem,
                    alternative: Some(&alternative),
                },
            )?;
            Ok(alternative.base)
        }
        EntityKind::Comment => {
            let comment = store.find_comment(id)?;
            let problem = store.problem(&comment.problem_id)?;
            ensure(
                user,
                Mode::View,
                &Target::Comment {
                    problem: &problem,
                    comment: &comment,
                },
            )?;
            Ok(comment.base)
        }
    }
}

pub fn handle_history(as_user: Option<String>, entity_type: String, id: String, json: bool) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let kind = parse_kind(&entity_type)?;
    let base = viewable(&store, &user, kind, &id)?;

    let history = store.history(kind, &base.id)?;
    let latest = activity_entry(&history, base.author);

    if json {
        let revisions: Vec<serde_json::Value> = history
            .diffs()
            .iter()
            .map(|d| {
                serde_json::json!({
                    "author": d.revision.author,
                    "updated": d.revision.updated,
                    "title": d.revision.title,
                    "content": d.revision.content,
                    "diff": d.render(),
                })
            })
            .collect();
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "kind": kind,
                "id": base.id,
                "latest": latest,
                "revisions": revisions,
            }))?
        );
        return Ok(());
    }

    println!(
        "{} {} - {} by {} on {}",
        kind,
        label(&base),
        latest.status,
        store.username(latest.actor)?,
        latest.date.format("%Y-%m-%d %H:%M")
    );
    for d in history.diffs() {
        println!(
            "\n  {} by {}",
            d.revision.updated.format("%Y-%m-%d %H:%M:%S"),
            store.username(d.revision.author)?
        );
        println!("    {}", d.render());
    }
    Ok(())
}

pub fn handle_activity(as_user: Option<String>, user: Option<i64>, page: u32, json: bool) -> Result<()> {
    let (root, store, acting) = open_project(as_user.as_deref())?;
    let config = Config::load(&root)?;

    let viewer = user.unwrap_or(acting.id);
    if viewer != 0 && viewer != acting.id && !acting.is_superuser {
        return Err(IdeastormError::forbidden(
            "view",
            format!("the activity of user {}", viewer),
        ));
    }

    let query = FeedQuery::from_raw(viewer, page)?.with_page_size(config.feed_page_size)?;
    let feed = store.activity_feed(&query)?;

    let unread = if acting.is_authenticated && viewer == acting.id {
        let count = store.activity_counter(acting.id)?;
        store.reset_activity_counter(acting.id)?;
        Some(count)
    } else {
        None
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&feed)?);
        return Ok(());
    }

    if let Some(count) = unread.filter(|c| *c > 0) {
        println!("{} new change(s) since you last looked\n", count);
    }
    if feed.items.is_empty() {
        println!("No activity.");
        return Ok(());
    }
    for item in &feed.items {
        println!(
            "  {}  {} {} {} '{}'",
            item.modified.format("%Y-%m-%d %H:%M"),
            store.username(item.author)?,
            item.verb,
            item.kind,
            item.title
        );
    }
    println!(
        "\nPage {} of {} ({} items)",
        feed.page,
        feed.page_count.max(1),
        feed.total
    );
    Ok(())
}

/// Authorize against a freshly loaded target. For `create` on a child kind
/// `id` names the problem.
fn check(store: &SqliteStore, user: &User, mode: Mode, kind: EntityKind, id: Option<&str>) -> Result<bool> {
    let required = || {
        id.ok_or_else(|| IdeastormError::InvalidArgument(format!("'{}' on {} needs an id", mode, kind)))
    };
    let creating = mode == Mode::Create;

    match kind {
        EntityKind::Problem => match id {
            None => authorize(user, mode, &Target::NewProblem),
            Some(id) => {
                let problem = store.find_problem(id)?;
                authorize(user, mode, &Target::Problem(&problem))
            }
        },
        EntityKind::Criteria if creating => {
            let problem = store.find_problem(required()?)?;
            authorize(
                user,
                mode,
                &Target::Criteria {
                    problem: &problem,
                    criteria: None,
                },
            )
        }
        EntityKind::Criteria => {
            let criteria = store.find_criteria(required()?)?;
            let problem = store.problem(&criteria.problem_id)?;
            authorize(
                user,
                mode,
                &Target::Criteria {
                    problem: &problem,
                    criteria: Some(&criteria),
                },
            )
        }
        EntityKind::Idea if creating => {
            let problem = store.find_problem(required()?)?;
            authorize(
                user,
                mode,
                &Target::Idea {
                    problem: &problem,
                    idea: None,
                },
            )
        }
        EntityKind::Idea => {
            let idea = store.find_idea(required()?)?;
            let problem = store.problem(&idea.problem_id)?;
            authorize(
                user,
                mode,
                &Target::Idea {
                    problem: &problem,
                    idea: Some(&idea),
                },
            )
        }
        EntityKind::Alternative if creating => {
            let problem = store.find_problem(required()?)?;
            authorize(
                user,
                mode,
                &Target::Alternative {
                    problem: &problem,
                    alternative: None,
                },
            )
        }
        EntityKind::Alternative => {
            let alternative = store.find_alternative(required()?)?;
            let problem = store.problem(&alternative.problem_id)?;
            authorize(
                user,
                mode,
                &Target::Alternative {
                    problem: &problem,
                    alternative: Some(&alternative),
                },
            )
        }
        EntityKind::Comment => {
            let comment = store.find_comment(required()?)?;
            let problem = store.problem(&comment.problem_id)?;
            authorize(
                user,
                mode,
                &Target::Comment {
                    problem: &problem,
                    comment: &comment,
                },
            )
        }
    }
}

pub fn handle_can(
    as_user: Option<String>,
    mode: String,
    entity_type: String,
    id: Option<String>,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let kind = parse_kind(&entity_type)?;
    let mode = Mode::parse_for(kind, &mode)?;

    let allowed = check(&store, &user, mode, kind, id.as_deref())?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "user": user.id,
                "mode": mode,
                "kind": kind,
                "allowed": allowed,
            }))?
        );
    } else {
        println!("{}", if allowed { "yes" } else { "no" });
    }
    Ok(())
}

pub fn handle_table(as_user: Option<String>, problem: String, json: bool) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let problem = store.find_problem(&problem)?;
    ensure(&user, Mode::View, &Target::Problem(&problem))?;

    let criteria = store.list_criteria(&problem.base.id)?;
    let alternatives = store.list_alternatives(&problem.base.id)?;
    let values = store.criteria_values(&problem.base.id)?;
    let table = ScoreTable::build(&criteria, &alternatives, &values);

    let mut votes = Vec::with_capacity(table.rows.len());
    for row in &table.rows {
        votes.push(tally(&store.votes_for(&VoteTarget::Alternative(row.alternative_id))?));
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "problem": problem.base.id,
                "columns": table.columns,
                "rows": table.rows,
                "votes": votes,
            }))?
        );
        return Ok(());
    }

    if table.rows.is_empty() {
        println!("No alternatives in '{}'.", problem.base.title);
        return Ok(());
    }

    let name_width = table.rows.iter().map(|r| r.name.len()).max().unwrap_or(0).max(11);
    let mut header = format!("{:<name_width$}", "Alternative");
    for column in &table.columns {
        header.push_str(&format!("  {:>12}", column.name));
    }
    header.push_str(&format!("  {:>6}", "Votes"));
    println!("{}", header);

    for (row, score) in table.rows.iter().zip(&votes) {
        let mut line = format!("{:<name_width$}", row.name);
        for result in &row.results {
            line.push_str(&format!("  {:>12}", result));
        }
        line.push_str(&format!("  {:>6}", score));
        println!("{}", line);
    }

    for (i, column) in table.columns.iter().enumerate() {
        if let Some(best) = table.best(i) {
            println!("\nBest on {} ({}): {}", column.name, column.order, best.name);
        }
    }
    Ok(())
}

pub fn handle_quantifier_totals(as_user: Option<String>, alternative: String, json: bool) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let alternative = store.find_alternative(&alternative)?;
    let problem = store.problem(&alternative.problem_id)?;
    ensure(
        &user,
        Mode::View,
        &Target::Alternative {
            problem: &problem,
            alternative: Some(&alternative),
        },
    )?;

    let values = store.quantifier_values(&alternative.idea_ids)?;
    let totals = aggregate_quantifiers(&values);

    let mut named: Vec<(String, Uuid, QuantifierTotal)> = Vec::with_capacity(totals.len());
    for (id, total) in &totals {
        let name = store
            .get_quantifier(id)?
            .map(|q| q.name)
            .unwrap_or_else(|| id.to_string());
        named.push((name, *id, *total));
    }
    named.sort_by(|a, b| a.0.cmp(&b.0).then(a.1.cmp(&b.1)));

    if json {
        let rows: Vec<serde_json::Value> = named
            .iter()
            .map(|(name, id, total)| {
                serde_json::json!({
                    "quantifier": id,
                    "name": name,
                    "total": total.total,
                    "format": total.format,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&rows)?);
    } else if named.is_empty() {
        println!("No numeric quantifier values for {}.", label(&alternative.base));
    } else {
        println!("Quantifier totals for {}:", label(&alternative.base));
        for (name, _, total) in named {
            match total.format {
                QuantifierFormat::Boolean => println!("  {}: {} yes", name, total.total),
                _ => println!("  {}: {}", name, total.total),
            }
        }
    }
    Ok(())
}
