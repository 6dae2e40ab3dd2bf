use std::env;
use std::io::{self, Read};
use std::path::PathBuf;

use crate::config::Config;
use crate::entity::{
    Alternative, Comment, CommentTarget, Criteria, EntityBase, EntityKind, Idea, Problem, Quantifier,
    QuantifierFormat, QuantifierInput, QuantifierValue, User, UserId, VoteTarget, VoteWeight,
};
use crate::error::{IdeastormError, Result};
use crate::permission::{ensure, toggle_comment, toggle_idea, Mode, Target};
use crate::scoring::{cast_vote, tally};
use crate::storage::{IdeaUpdate, ProblemUpdate, SqliteStore, DATA_DIR};

/// Find the project root by looking for .ideastorm/ or .git/
pub(super) fn find_project_root() -> PathBuf {
    let cwd = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));

    let mut current = cwd.as_path();
    loop {
        if current.join(DATA_DIR).exists() || current.join(".git").exists() {
            return current.to_path_buf();
        }
        match current.parent() {
            Some(parent) => current = parent,
            None => return cwd,
        }
    }
}

/// Open the project store and resolve the acting user
pub(super) fn open_project(as_user: Option<&str>) -> Result<(PathBuf, SqliteStore, User)> {
    let root = find_project_root();
    let store = SqliteStore::open(&root)?;
    let user = match as_user {
        Some(name) => store.get_user(name)?,
        None => User::anonymous(),
    };
    tracing::debug!(root = %root.display(), user = %user, "project opened");
    Ok((root, store, user))
}

pub(super) fn parse_kind(raw: &str) -> Result<EntityKind> {
    raw.parse().map_err(IdeastormError::InvalidEntityType)
}

/// `003 (a1b2c3d) - Title`
pub(super) fn label(base: &EntityBase) -> String {
    format!("{} - {}", base.short_id(), base.title)
}

fn read_stdin() -> Result<Option<String>> {
    let mut content = String::new();
    io::stdin().read_to_string(&mut content)?;
    Ok((!content.is_empty()).then_some(content))
}

fn user_ids(store: &SqliteStore, names: &[String]) -> Result<Vec<UserId>> {
    names
        .iter()
        .map(|name| store.get_user(name).map(|user| user.id))
        .collect()
}

fn invalid(e: String) -> IdeastormError {
    IdeastormError::InvalidArgument(e)
}

pub fn handle_init() -> Result<()> {
    let root = env::current_dir()?;

    let _store = SqliteStore::init(&root)?;
    Config::default().save(&root)?;

    println!("Initialized ideastorm project in {}", root.display());
    Ok(())
}

// Users

/// The first user may be added by anyone; after that only superusers add users
pub fn handle_user_add(as_user: Option<String>, username: String, superuser: bool) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;

    if !store.list_users()?.is_empty() && !user.is_superuser {
        return Err(IdeastormError::forbidden("add", "users"));
    }

    let added = store.add_user(&username, superuser)?;
    println!(
        "Added {}user {} ({})",
        if added.is_superuser { "super" } else { "" },
        added.id,
        added.username
    );
    Ok(())
}

pub fn handle_user_list(json: bool) -> Result<()> {
    let (_, store, _) = open_project(None)?;
    let users = store.list_users()?;

    if json {
        println!("{}", serde_json::to_string_pretty(&users)?);
    } else if users.is_empty() {
        println!("No users found.");
    } else {
        for user in users {
            let marker = if user.is_superuser { " [superuser]" } else { "" };
            println!("  {:>3} {}{}", user.id, user.username, marker);
        }
    }
    Ok(())
}

// Add

#[allow(clippy::too_many_arguments)]
pub fn handle_add_problem(
    as_user: Option<String>,
    title: String,
    private: bool,
    closed: bool,
    draft: bool,
    contributors: Vec<String>,
    managers: Vec<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let (root, store, user) = open_project(as_user.as_deref())?;
    let config = Config::load(&root)?;
    ensure(&user, Mode::Create, &Target::NewProblem)?;

    let seq = store.next_sequence_number(EntityKind::Problem)?;
    let mut problem = Problem::new(title, user.id, seq);
    problem.public = config.default_public && !private;
    problem.open = config.default_open && !closed;
    problem.published = !draft;
    problem.contributors.extend(user_ids(&store, &contributors)?);
    problem.managers.extend(user_ids(&store, &managers)?);

    if stdin {
        problem.base.content = read_stdin()?;
    }

    store.add_problem(&problem)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&problem)?);
    } else {
        println!("Created problem {}", label(&problem.base));
    }
    Ok(())
}

#[allow(clippy::too_many_arguments)]
pub fn handle_add_criteria(
    as_user: Option<String>,
    problem: String,
    title: String,
    format: String,
    weight: Option<u32>,
    (min, max): (Option<i64>, Option<i64>),
    result: String,
    order: String,
    parent: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let problem = store.find_problem(&problem)?;
    ensure(
        &user,
        Mode::Create,
        &Target::Criteria {
            problem: &problem,
            criteria: None,
        },
    )?;

    let seq = store.next_sequence_number(EntityKind::Criteria)?;
    let mut criteria = Criteria::new(title, problem.base.id, user.id, seq);
    criteria.format = format.parse().map_err(invalid)?;
    criteria.result = result.parse().map_err(invalid)?;
    criteria.order = order.parse().map_err(invalid)?;
    criteria.weight = weight;
    criteria.min = min;
    criteria.max = max;
    criteria.check_bounds().map_err(invalid)?;

    if let Some(parent) = parent {
        let parent = store.find_criteria(&parent)?;
        if parent.problem_id != problem.base.id {
            return Err(invalid(format!(
                "parent criteria '{}' belongs to another problem",
                parent.base.title
            )));
        }
        criteria.parent_id = Some(parent.base.id);
    }
    if stdin {
        criteria.base.content = read_stdin()?;
    }

    store.add_criteria(&criteria)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&criteria)?);
    } else {
        println!("Created criteria {}", label(&criteria.base));
    }
    Ok(())
}

pub fn handle_add_idea(
    as_user: Option<String>,
    problem: String,
    title: String,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let problem = store.find_problem(&problem)?;
    ensure(
        &user,
        Mode::Create,
        &Target::Idea {
            problem: &problem,
            idea: None,
        },
    )?;

    let seq = store.next_sequence_number(EntityKind::Idea)?;
    let mut idea = Idea::new(title, problem.base.id, user.id, seq);
    if stdin {
        idea.base.content = read_stdin()?;
    }

    store.add_idea(&idea)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&idea)?);
    } else {
        println!("Created idea {}", label(&idea.base));
    }
    Ok(())
}

pub fn handle_add_alternative(
    as_user: Option<String>,
    problem: String,
    name: String,
    ideas: Vec<String>,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let problem = store.find_problem(&problem)?;
    ensure(
        &user,
        Mode::Create,
        &Target::Alternative {
            problem: &problem,
            alternative: None,
        },
    )?;

    let seq = store.next_sequence_number(EntityKind::Alternative)?;
    let mut alternative = Alternative::new(name, problem.base.id, user.id, seq);
    alternative.order = u32::try_from(store.list_alternatives(&problem.base.id)?.len())
        .unwrap_or(u32::MAX)
        .saturating_add(1);
    for raw in &ideas {
        let idea = store.find_idea(raw)?;
        if idea.is_deleted() {
            return Err(invalid(format!("idea '{}' is deleted", idea.base.title)));
        }
        alternative.idea_ids.push(idea.base.id);
    }

    store.add_alternative(&alternative)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&alternative)?);
    } else {
        println!(
            "Created alternative {} with {} idea(s)",
            label(&alternative.base),
            alternative.idea_ids.len()
        );
    }
    Ok(())
}

/// Parse a comment target in format "type:id"
fn parse_comment_target(store: &SqliteStore, problem: &Problem, raw: &str) -> Result<CommentTarget> {
    let (kind, id) = raw
        .split_once(':')
        .ok_or_else(|| invalid(format!("Invalid target '{}'. Expected 'type:id'", raw)))?;

    let (target, owner) = match parse_kind(kind)? {
        EntityKind::Problem => {
            let target = store.find_problem(id)?;
            (CommentTarget::Problem, target.base.id)
        }
        EntityKind::Criteria => {
            let target = store.find_criteria(id)?;
            (CommentTarget::Criteria(target.base.id), target.problem_id)
        }
        EntityKind::Idea => {
            let target = store.find_idea(id)?;
            (CommentTarget::Idea(target.base.id), target.problem_id)
        }
        EntityKind::Alternative => {
            let target = store.find_alternative(id)?;
            (CommentTarget::Alternative(target.base.id), target.problem_id)
        }
        EntityKind::Comment => return Err(invalid("comments cannot be commented on".to_string())),
    };

    if owner != problem.base.id {
        return Err(invalid(format!(
            "{} does not belong to problem '{}'",
            raw, problem.base.title
        )));
    }
    Ok(target)
}

pub fn handle_add_comment(
    as_user: Option<String>,
    problem: String,
    text: String,
    on: Option<String>,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let problem = store.find_problem(&problem)?;
    ensure(&user, Mode::Comment, &Target::Problem(&problem))?;

    let target = match on {
        Some(raw) => parse_comment_target(&store, &problem, &raw)?,
        None => CommentTarget::Problem,
    };
    let seq = store.next_sequence_number(EntityKind::Comment)?;
    let comment = Comment::new(text, problem.base.id, target, user.id, seq);

    store.add_comment(&comment)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&comment)?);
    } else {
        println!(
            "Added comment {:03} on {} in '{}'",
            comment.base.sequence_number,
            comment.target.kind(),
            problem.base.title
        );
    }
    Ok(())
}

// Update

#[allow(clippy::too_many_arguments)]
pub fn handle_update_problem(
    as_user: Option<String>,
    id: String,
    title: Option<String>,
    public: Option<bool>,
    open: Option<bool>,
    published: Option<bool>,
    locked: Option<bool>,
    add_contributors: Vec<String>,
    add_managers: Vec<String>,
    remove_members: Vec<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let problem = store.find_problem(&id)?;

    let mut update = ProblemUpdate {
        title,
        public,
        open,
        published,
        locked,
        add_contributors: user_ids(&store, &add_contributors)?,
        add_managers: user_ids(&store, &add_managers)?,
        remove_members: user_ids(&store, &remove_members)?,
        ..Default::default()
    };
    if stdin {
        update.content = read_stdin()?;
    }

    // Text edits are open to contributors; flags and membership are managerial
    if update.touches_text() {
        ensure(&user, Mode::Update, &Target::Problem(&problem))?;
    }
    let manages = update.public.is_some()
        || update.open.is_some()
        || update.published.is_some()
        || update.locked.is_some()
        || !update.add_contributors.is_empty()
        || !update.add_managers.is_empty()
        || !update.remove_members.is_empty();
    if manages {
        ensure(&user, Mode::Manage, &Target::Problem(&problem))?;
    }
    if !update.touches_text() && !manages {
        return Err(invalid("nothing to update".to_string()));
    }

    let updated = store.update_problem(&problem.base.id, update, user.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated problem {}", label(&updated.base));
    }
    Ok(())
}

pub fn handle_update_idea(
    as_user: Option<String>,
    id: String,
    title: Option<String>,
    stdin: bool,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let idea = store.find_idea(&id)?;
    let problem = store.problem(&idea.problem_id)?;
    ensure(
        &user,
        Mode::Update,
        &Target::Idea {
            problem: &problem,
            idea: Some(&idea),
        },
    )?;

    let mut update = IdeaUpdate {
        title,
        content: None,
    };
    if stdin {
        update.content = read_stdin()?;
    }
    if update.title.is_none() && update.content.is_none() {
        return Err(invalid("nothing to update".to_string()));
    }

    let updated = store.update_idea(&idea.base.id, update, user.id)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&updated)?);
    } else {
        println!("Updated idea {}", label(&updated.base));
    }
    Ok(())
}

// Delete

/// Ask before a hard delete unless forced. Returns false when cancelled.
fn confirm_delete(kind: EntityKind, base: &EntityBase, force: bool) -> Result<bool> {
    if force {
        return Ok(true);
    }
    eprintln!("Delete {} {}? [y/N] ", kind, label(base));

    // Check if stdin is a tty for interactive confirmation
    if atty::is(atty::Stream::Stdin) {
        let mut input = String::new();
        io::stdin().read_line(&mut input)?;
        Ok(input.trim().eq_ignore_ascii_case("y"))
    } else {
        Err(invalid(
            "Use --force to delete in non-interactive mode".to_string(),
        ))
    }
}

pub fn handle_delete(as_user: Option<String>, entity_type: String, id: String, force: bool) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let kind = parse_kind(&entity_type)?;

    match kind {
        EntityKind::Problem => {
            let problem = store.find_problem(&id)?;
            ensure(&user, Mode::Delete, &Target::Problem(&problem))?;
            if !confirm_delete(kind, &problem.base, force)? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete_problem(&problem.base.id)?;
            println!("Deleted problem {}", label(&problem.base));
        }
        EntityKind::Criteria => {
            let criteria = store.find_criteria(&id)?;
            let problem = store.problem(&criteria.problem_id)?;
            ensure(
                &user,
                Mode::Delete,
                &Target::Criteria {
                    problem: &problem,
                    criteria: Some(&criteria),
                },
            )?;
            if !confirm_delete(kind, &criteria.base, force)? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete_criteria(&criteria.base.id)?;
            println!("Deleted criteria {}", label(&criteria.base));
        }
        EntityKind::Alternative => {
            let alternative = store.find_alternative(&id)?;
            let problem = store.problem(&alternative.problem_id)?;
            ensure(
                &user,
                Mode::Delete,
                &Target::Alternative {
                    problem: &problem,
                    alternative: Some(&alternative),
                },
            )?;
            if !confirm_delete(kind, &alternative.base, force)? {
                println!("Cancelled.");
                return Ok(());
            }
            store.delete_alternative(&alternative.base.id)?;
            println!("Deleted alternative {}", label(&alternative.base));
        }
        EntityKind::Idea => {
            let mut idea = store.find_idea(&id)?;
            let problem = store.problem(&idea.problem_id)?;
            let toggled = toggle_idea(&user, &problem, &mut idea)?;
            store.save_idea_deletion(&idea)?;
            println!("Idea {} {}", label(&idea.base), toggled);
        }
        EntityKind::Comment => {
            let mut comment = store.find_comment(&id)?;
            let problem = store.problem(&comment.problem_id)?;
            let toggled = toggle_comment(&user, &problem, &mut comment)?;
            store.save_comment_deletion(&comment)?;
            println!("Comment {:03} {}", comment.base.sequence_number, toggled);
        }
    }
    Ok(())
}

// Votes and values

pub fn handle_vote(
    as_user: Option<String>,
    id: String,
    down: bool,
    alternative: bool,
    json: bool,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;

    let (target, name) = if alternative {
        let alternative = store.find_alternative(&id)?;
        let problem = store.problem(&alternative.problem_id)?;
        ensure(
            &user,
            Mode::Vote,
            &Target::Alternative {
                problem: &problem,
                alternative: Some(&alternative),
            },
        )?;
        (VoteTarget::Alternative(alternative.base.id), label(&alternative.base))
    } else {
        let idea = store.find_idea(&id)?;
        if idea.is_deleted() {
            return Err(invalid(format!("idea '{}' is deleted", idea.base.title)));
        }
        let problem = store.problem(&idea.problem_id)?;
        ensure(
            &user,
            Mode::Vote,
            &Target::Idea {
                problem: &problem,
                idea: Some(&idea),
            },
        )?;
        (VoteTarget::Idea(idea.base.id), label(&idea.base))
    };

    let requested = if down { VoteWeight::Down } else { VoteWeight::Up };
    let (weight, change) = cast_vote(store.get_vote(user.id, &target)?, requested);
    store.set_vote(user.id, &target, weight)?;
    let score = tally(&store.votes_for(&target)?);
    tracing::info!(user = user.id, target = %target.id(), %change, "vote changed");

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&serde_json::json!({
                "target": target,
                "change": change,
                "weight": weight,
                "score": score,
            }))?
        );
    } else {
        println!("Vote {} on {} (score {})", change, name, score);
    }
    Ok(())
}

pub fn handle_score(as_user: Option<String>, idea: String, criteria: String, value: i64) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let idea = store.find_idea(&idea)?;
    let criteria = store.find_criteria(&criteria)?;
    if idea.problem_id != criteria.problem_id {
        return Err(invalid(format!(
            "idea '{}' and criteria '{}' belong to different problems",
            idea.base.title, criteria.base.title
        )));
    }
    let problem = store.problem(&idea.problem_id)?;
    ensure(
        &user,
        Mode::Update,
        &Target::Idea {
            problem: &problem,
            idea: Some(&idea),
        },
    )?;
    criteria.check_value(value).map_err(invalid)?;

    store.set_criteria_value(&idea.base.id, &criteria.base.id, value)?;
    tracing::info!(idea = %idea.base.id, criteria = %criteria.base.id, value, "criteria value set");
    println!("Scored idea {} on '{}': {}", label(&idea.base), criteria.base.title, value);
    Ok(())
}

pub fn handle_quantifier_add(
    as_user: Option<String>,
    criteria: String,
    name: String,
    format: String,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let criteria = store.find_criteria(&criteria)?;
    let problem = store.problem(&criteria.problem_id)?;
    ensure(
        &user,
        Mode::Update,
        &Target::Criteria {
            problem: &problem,
            criteria: Some(&criteria),
        },
    )?;

    let format: QuantifierFormat = format.parse().map_err(invalid)?;
    let quantifier = Quantifier::new(name, criteria.base.id, format);
    store.add_quantifier(&quantifier)?;
    tracing::info!(quantifier = %quantifier.id, criteria = %criteria.base.id, "quantifier created");

    println!(
        "Created {} quantifier {} ({}) on '{}'",
        quantifier.format,
        quantifier.name,
        &quantifier.id.to_string()[..7],
        criteria.base.title
    );
    Ok(())
}

pub fn handle_quantifier_set(
    as_user: Option<String>,
    quantifier: String,
    idea: String,
    value: String,
) -> Result<()> {
    let (_, store, user) = open_project(as_user.as_deref())?;
    let quantifier = store.find_quantifier(&quantifier)?;
    let idea = store.find_idea(&idea)?;
    let criteria = store
        .get_criteria(&quantifier.criteria_id)?
        .ok_or_else(|| IdeastormError::EntityNotFound(format!("criteria {}", quantifier.criteria_id)))?;
    if criteria.problem_id != idea.problem_id {
        return Err(invalid(format!(
            "quantifier '{}' belongs to another problem",
            quantifier.name
        )));
    }
    let problem = store.problem(&idea.problem_id)?;
    ensure(
        &user,
        Mode::Update,
        &Target::Idea {
            problem: &problem,
            idea: Some(&idea),
        },
    )?;

    let value = QuantifierInput::parse(quantifier.format, &value).map_err(invalid)?;
    store.set_quantifier_value(&QuantifierValue {
        quantifier_id: quantifier.id,
        idea_id: idea.base.id,
        value: value.clone(),
    })?;
    tracing::info!(quantifier = %quantifier.id, idea = %idea.base.id, "quantifier value set");

    println!("Set {} = {} on idea {}", quantifier.name, value, label(&idea.base));
    Ok(())
}
