mod commands;
mod handlers;
mod queries;

pub use commands::{
    AddCommand, AddEntity, Cli, Commands, QuantifierAction, QuantifierCommand, UpdateCommand,
    UpdateEntity, UserAction, UserCommand,
};
pub use handlers::{
    handle_add_alternative, handle_add_comment, handle_add_criteria, handle_add_idea,
    handle_add_problem, handle_delete, handle_init, handle_quantifier_add, handle_quantifier_set,
    handle_score, handle_update_idea, handle_update_problem, handle_user_add, handle_user_list,
    handle_vote,
};
pub use queries::{
    handle_activity, handle_can, handle_history, handle_list, handle_quantifier_totals,
    handle_table,
};
