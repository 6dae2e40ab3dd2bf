use clap::{Args, Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "ideastorm")]
#[command(version, about = "Collaborative problem solving: problems, criteria, ideas and alternatives")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Act as this user (anonymous when omitted)
    #[arg(long = "as", global = true, value_name = "USERNAME")]
    pub as_user: Option<String>,

    /// Log debug output to stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize a new ideastorm project in the current directory
    Init,

    /// Manage users
    User(UserCommand),

    /// Add a new entity
    Add(AddCommand),

    /// List problems, or the children of one problem
    List {
        /// Entity type to list (problem, criteria, idea, alternative, comment)
        #[arg(value_name = "TYPE", default_value = "problem")]
        entity_type: String,

        /// Owning problem, required for everything but problems
        #[arg(long, short = 'p')]
        problem: Option<String>,

        /// Include soft-deleted ideas
        #[arg(long)]
        deleted: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update an existing entity
    Update(UpdateCommand),

    /// Delete a problem, criteria or alternative; toggle deletion of an idea or comment
    Delete {
        /// Entity type
        #[arg(value_name = "TYPE")]
        entity_type: String,

        /// Entity ID (sequence number like "3" or UUID prefix like "a1b2c")
        id: String,

        /// Skip confirmation for hard deletes
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Vote on an idea; repeating the same vote withdraws it
    Vote {
        /// Idea ID, or alternative ID with --alternative
        id: String,

        /// Vote down instead of up
        #[arg(long)]
        down: bool,

        /// The ID names an alternative
        #[arg(long)]
        alternative: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Record an idea's value for a criteria
    Score {
        /// Idea ID
        idea: String,

        /// Criteria ID
        criteria: String,

        /// Value in the criteria's unit (currency in minor units, 0 or 1 for yes/no)
        #[arg(allow_hyphen_values = true)]
        value: i64,
    },

    /// Manage quantifiers and their measured values
    Quantifier(QuantifierCommand),

    /// Show the revision history of an entity with diffs
    History {
        /// Entity type
        #[arg(value_name = "TYPE")]
        entity_type: String,

        /// Entity ID
        id: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the activity feed
    Activity {
        /// Show what this user id may see; 0 means public items only.
        /// Defaults to the acting user.
        #[arg(long)]
        user: Option<i64>,

        /// Page number, starting at 1
        #[arg(long, default_value = "1")]
        page: u32,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check whether the acting user may perform an action
    Can {
        /// Permission mode (view, create, update, delete, undelete, edit, manage, contribute, comment, vote)
        mode: String,

        /// Entity type
        #[arg(value_name = "TYPE")]
        entity_type: String,

        /// Entity ID. For `create` on a child type this is the problem;
        /// omit it for `create problem`.
        id: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Score alternatives against criteria
    Table {
        /// Problem ID
        problem: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct UserCommand {
    #[command(subcommand)]
    pub action: UserAction,
}

#[derive(Subcommand, Debug)]
pub enum UserAction {
    /// Register a user
    Add {
        username: String,

        /// Grant superuser rights
        #[arg(long)]
        superuser: bool,
    },

    /// List users
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct AddCommand {
    #[command(subcommand)]
    pub entity: AddEntity,
}

#[derive(Subcommand, Debug)]
pub enum AddEntity {
    /// Add a new problem
    Problem {
        /// Problem title
        title: String,

        /// Hide the problem from non-collaborators
        #[arg(long)]
        private: bool,

        /// Only collaborators may contribute
        #[arg(long)]
        closed: bool,

        /// Keep the problem as an unpublished draft
        #[arg(long)]
        draft: bool,

        /// Contributor usernames (can be specified multiple times)
        #[arg(long = "contributor", short = 'c')]
        contributors: Vec<String>,

        /// Manager usernames (can be specified multiple times)
        #[arg(long = "manager", short = 'm')]
        managers: Vec<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add a criteria to a problem
    Criteria {
        /// Problem ID
        problem: String,

        /// Criteria name
        title: String,

        /// Value format (number, currency, scale, time, boolean)
        #[arg(long, default_value = "number")]
        format: String,

        /// Weight applied by sum and average results
        #[arg(long)]
        weight: Option<u32>,

        /// Lowest accepted value of a scale criteria
        #[arg(long, allow_hyphen_values = true)]
        min: Option<i64>,

        /// Highest accepted value of a scale criteria
        #[arg(long, allow_hyphen_values = true)]
        max: Option<i64>,

        /// How idea values combine (sum, average, absolute)
        #[arg(long, default_value = "sum")]
        result: String,

        /// Which way is better (asc, desc)
        #[arg(long, default_value = "asc")]
        order: String,

        /// Parent criteria ID
        #[arg(long)]
        parent: Option<String>,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an idea to a problem
    Idea {
        /// Problem ID
        problem: String,

        /// Idea title
        title: String,

        /// Read content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Add an alternative grouping existing ideas
    Alternative {
        /// Problem ID
        problem: String,

        /// Alternative name
        name: String,

        /// Idea IDs to include (can be specified multiple times)
        #[arg(long = "idea", short = 'i')]
        ideas: Vec<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Comment on a problem or one of its entities
    Comment {
        /// Problem ID
        problem: String,

        /// Comment text
        text: String,

        /// Commented entity in format "type:id", e.g. "idea:3"
        #[arg(long)]
        on: Option<String>,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct UpdateCommand {
    #[command(subcommand)]
    pub entity: UpdateEntity,
}

#[derive(Subcommand, Debug)]
pub enum UpdateEntity {
    /// Update a problem's text, flags or members
    Problem {
        /// Problem ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        #[arg(long)]
        public: Option<bool>,

        #[arg(long)]
        open: Option<bool>,

        #[arg(long)]
        published: Option<bool>,

        #[arg(long)]
        locked: Option<bool>,

        /// Add contributor usernames
        #[arg(long = "add-contributor")]
        add_contributors: Vec<String>,

        /// Add manager usernames
        #[arg(long = "add-manager")]
        add_managers: Vec<String>,

        /// Remove usernames from both roles
        #[arg(long = "remove-member")]
        remove_members: Vec<String>,

        /// Read new content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Update an idea's text
    Idea {
        /// Idea ID
        id: String,

        /// New title
        #[arg(long)]
        title: Option<String>,

        /// Read new content from stdin
        #[arg(long)]
        stdin: bool,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Args, Debug)]
pub struct QuantifierCommand {
    #[command(subcommand)]
    pub action: QuantifierAction,
}

#[derive(Subcommand, Debug)]
pub enum QuantifierAction {
    /// Define a quantifier under a criteria
    Add {
        /// Criteria ID
        criteria: String,

        /// Quantifier name
        name: String,

        /// Value format (number, boolean, text, daterange)
        #[arg(long, default_value = "number")]
        format: String,
    },

    /// Record a quantifier value for an idea
    Set {
        /// Quantifier ID prefix
        quantifier: String,

        /// Idea ID
        idea: String,

        /// Value; date ranges as YYYY-MM-DD..YYYY-MM-DD
        #[arg(allow_hyphen_values = true)]
        value: String,
    },

    /// Roll up quantifier values over an alternative's ideas
    Totals {
        /// Alternative ID
        alternative: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}
