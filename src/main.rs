use clap::Parser;
use ideastorm::cli::{
    handle_activity, handle_add_alternative, handle_add_comment, handle_add_criteria,
    handle_add_idea, handle_add_problem, handle_can, handle_delete, handle_history, handle_init,
    handle_list, handle_quantifier_add, handle_quantifier_set, handle_quantifier_totals,
    handle_score, handle_table, handle_update_idea, handle_update_problem, handle_user_add,
    handle_user_list, handle_vote, AddEntity, Cli, Commands, QuantifierAction, UpdateEntity,
    UserAction,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Logs go to stderr so `--json` output on stdout stays parseable
fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env("IDEASTORM_LOG").unwrap_or_else(|_| EnvFilter::new(fallback)))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    let as_user = cli.as_user;

    let result = match cli.command {
        Commands::Init => handle_init(),
        Commands::User(user_cmd) => match user_cmd.action {
            UserAction::Add { username, superuser } => handle_user_add(as_user, username, superuser),
            UserAction::List { json } => handle_user_list(json),
        },
        Commands::Add(add) => match add.entity {
            AddEntity::Problem {
                title,
                private,
                closed,
                draft,
                contributors,
                managers,
                stdin,
                json,
            } => handle_add_problem(
                as_user, title, private, closed, draft, contributors, managers, stdin, json,
            ),
            AddEntity::Criteria {
                problem,
                title,
                format,
                weight,
                min,
                max,
                result,
                order,
                parent,
                stdin,
                json,
            } => handle_add_criteria(
                as_user,
                problem,
                title,
                format,
                weight,
                (min, max),
                result,
                order,
                parent,
                stdin,
                json,
            ),
            AddEntity::Idea {
                problem,
                title,
                stdin,
                json,
            } => handle_add_idea(as_user, problem, title, stdin, json),
            AddEntity::Alternative {
                problem,
                name,
                ideas,
                json,
            } => handle_add_alternative(as_user, problem, name, ideas, json),
            AddEntity::Comment {
                problem,
                text,
                on,
                json,
            } => handle_add_comment(as_user, problem, text, on, json),
        },
        Commands::List {
            entity_type,
            problem,
            deleted,
            json,
        } => handle_list(as_user, entity_type, problem, deleted, json),
        Commands::Update(update) => match update.entity {
            UpdateEntity::Problem {
                id,
                title,
                public,
                open,
                published,
                locked,
                add_contributors,
                add_managers,
                remove_members,
                stdin,
                json,
            } => handle_update_problem(
                as_user,
                id,
                title,
                public,
                open,
                published,
                locked,
                add_contributors,
                add_managers,
                remove_members,
                stdin,
                json,
            ),
            UpdateEntity::Idea {
                id,
                title,
                stdin,
                json,
            } => handle_update_idea(as_user, id, title, stdin, json),
        },
        Commands::Delete {
            entity_type,
            id,
            force,
        } => handle_delete(as_user, entity_type, id, force),
        Commands::Vote {
            id,
            down,
            alternative,
            json,
        } => handle_vote(as_user, id, down, alternative, json),
        Commands::Score {
            idea,
            criteria,
            value,
        } => handle_score(as_user, idea, criteria, value),
        Commands::Quantifier(quantifier_cmd) => match quantifier_cmd.action {
            QuantifierAction::Add {
                criteria,
                name,
                format,
            } => handle_quantifier_add(as_user, criteria, name, format),
            QuantifierAction::Set {
                quantifier,
                idea,
                value,
            } => handle_quantifier_set(as_user, quantifier, idea, value),
            QuantifierAction::Totals { alternative, json } => {
                handle_quantifier_totals(as_user, alternative, json)
            }
        },
        Commands::History {
            entity_type,
            id,
            json,
        } => handle_history(as_user, entity_type, id, json),
        Commands::Activity { user, page, json } => handle_activity(as_user, user, page, json),
        Commands::Can {
            mode,
            entity_type,
            id,
            json,
        } => handle_can(as_user, mode, entity_type, id, json),
        Commands::Table { problem, json } => handle_table(as_user, problem, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
