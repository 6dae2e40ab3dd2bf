//! Permission evaluation for problems and everything attached to them.
//!
//! [`authorize`] answers whether a user may perform a [`Mode`] on a
//! [`Target`]. A refusal is `Ok(false)`; an `Err` only signals a mode that
//! does not exist for the target's entity kind, which is a caller bug.
//! Superusers are allowed everything before any per-entity rule runs.

mod alternative;
mod comment;
mod criteria;
mod idea;
mod problem;
mod soft_delete;
mod visibility;

pub use soft_delete::{toggle_comment, toggle_idea, Toggled};
pub use visibility::{visible_filter, Scope, VisibilityFilter};

use serde::{Deserialize, Serialize};

use crate::entity::{Alternative, Comment, Criteria, EntityKind, Idea, Problem, User};
use crate::error::{IdeastormError, Result};

/// An action a user may attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    View,
    Create,
    Update,
    Delete,
    Undelete,
    Edit,
    Manage,
    Contribute,
    Comment,
    Vote,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mode::View => write!(f, "view"),
            Mode::Create => write!(f, "create"),
            Mode::Update => write!(f, "update"),
            Mode::Delete => write!(f, "delete"),
            Mode::Undelete => write!(f, "undelete"),
            Mode::Edit => write!(f, "edit"),
            Mode::Manage => write!(f, "manage"),
            Mode::Contribute => write!(f, "contribute"),
            Mode::Comment => write!(f, "comment"),
            Mode::Vote => write!(f, "vote"),
        }
    }
}

impl std::str::FromStr for Mode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "view" => Ok(Mode::View),
            "create" => Ok(Mode::Create),
            "update" => Ok(Mode::Update),
            "delete" => Ok(Mode::Delete),
            "undelete" => Ok(Mode::Undelete),
            "edit" => Ok(Mode::Edit),
            "manage" => Ok(Mode::Manage),
            "contribute" => Ok(Mode::Contribute),
            "comment" => Ok(Mode::Comment),
            "vote" => Ok(Mode::Vote),
            _ => Err(format!("Unknown mode: {}", s)),
        }
    }
}

impl Mode {
    /// Modes defined for an entity kind
    pub fn supported_by(kind: EntityKind) -> &'static [Mode] {
        match kind {
            EntityKind::Problem => &[
                Mode::View,
                Mode::Create,
                Mode::Update,
                Mode::Delete,
                Mode::Manage,
                Mode::Contribute,
                Mode::Comment,
                Mode::Vote,
            ],
            EntityKind::Criteria => &[Mode::View, Mode::Create, Mode::Update, Mode::Delete],
            EntityKind::Idea => &[
                Mode::View,
                Mode::Create,
                Mode::Update,
                Mode::Delete,
                Mode::Vote,
                Mode::Undelete,
            ],
            EntityKind::Alternative => &[
                Mode::View,
                Mode::Create,
                Mode::Update,
                Mode::Delete,
                Mode::Vote,
            ],
            EntityKind::Comment => &[Mode::View, Mode::Edit, Mode::Manage],
        }
    }

    /// Parse a mode string and check it exists for `kind`
    pub fn parse_for(kind: EntityKind, raw: &str) -> Result<Mode> {
        let mode: Mode = raw.parse().map_err(|_| invalid_mode(kind, raw))?;
        if Mode::supported_by(kind).contains(&mode) {
            Ok(mode)
        } else {
            Err(invalid_mode(kind, raw))
        }
    }
}

/// What a permission check is about.
///
/// Child entities always travel with their problem. A `None` child means the
/// problem is the object, as for `create`.
#[derive(Debug, Clone, Copy)]
pub enum Target<'a> {
    /// A problem that does not exist yet
    NewProblem,
    Problem(&'a Problem),
    Criteria {
        problem: &'a Problem,
        criteria: Option<&'a Criteria>,
    },
    Idea {
        problem: &'a Problem,
        idea: Option<&'a Idea>,
    },
    Alternative {
        problem: &'a Problem,
        alternative: Option<&'a Alternative>,
    },
    Comment {
        problem: &'a Problem,
        comment: &'a Comment,
    },
}

impl Target<'_> {
    pub fn kind(&self) -> EntityKind {
        match self {
            Target::NewProblem | Target::Problem(_) => EntityKind::Problem,
            Target::Criteria { .. } => EntityKind::Criteria,
            Target::Idea { .. } => EntityKind::Idea,
            Target::Alternative { .. } => EntityKind::Alternative,
            Target::Comment { .. } => EntityKind::Comment,
        }
    }

    /// Human readable description used in denial messages
    pub fn describe(&self) -> String {
        match self {
            Target::NewProblem => "problem".to_string(),
            Target::Problem(p) => format!("problem '{}'", p.base.title),
            Target::Criteria { criteria: Some(c), .. } => format!("criteria '{}'", c.base.title),
            Target::Idea { idea: Some(i), .. } => format!("idea '{}'", i.base.title),
            Target::Alternative {
                alternative: Some(a),
                ..
            } => format!("alternative '{}'", a.base.title),
            Target::Comment { comment, .. } => format!("comment {}", comment.base.sequence_number),
            Target::Criteria { problem, .. }
            | Target::Idea { problem, .. }
            | Target::Alternative { problem, .. } => {
                format!("{} in problem '{}'", self.kind(), problem.base.title)
            }
        }
    }
}

/// Decide whether `user` may perform `mode` on `target`
pub fn authorize(user: &User, mode: Mode, target: &Target<'_>) -> Result<bool> {
    let kind = target.kind();
    if !Mode::supported_by(kind).contains(&mode) {
        return Err(invalid_mode(kind, &mode.to_string()));
    }

    let allowed = if user.is_superuser {
        true
    } else {
        match *target {
            Target::NewProblem => problem::allows_new(user, mode)?,
            Target::Problem(p) => problem::allows(user, mode, p),
            Target::Criteria { problem, criteria } => criteria::allows(user, mode, problem, criteria)?,
            Target::Idea { problem, idea } => idea::allows(user, mode, problem, idea)?,
            Target::Alternative {
                problem,
                alternative,
            } => alternative::allows(user, mode, problem, alternative)?,
            Target::Comment { problem, comment } => comment::allows(user, mode, problem, comment),
        }
    };

    tracing::debug!(user = user.id, %mode, %kind, allowed, "permission check");
    Ok(allowed)
}

/// Like [`authorize`], but a refusal becomes [`IdeastormError::Forbidden`]
pub fn ensure(user: &User, mode: Mode, target: &Target<'_>) -> Result<()> {
    if authorize(user, mode, target)? {
        Ok(())
    } else {
        Err(IdeastormError::forbidden(mode, target.describe()))
    }
}

fn invalid_mode(kind: EntityKind, mode: &str) -> IdeastormError {
    IdeastormError::InvalidMode {
        kind: kind.to_string(),
        mode: mode.to_string(),
    }
}

/// The child entity is required for this mode but the caller passed only
/// the problem
fn missing_object(kind: EntityKind, mode: Mode) -> IdeastormError {
    IdeastormError::InvalidArgument(format!("'{}' on {} needs the {} itself", mode, kind, kind))
}

#[cfg(test)]
pub(crate) mod fixtures {
    use uuid::Uuid;

    use crate::entity::{Alternative, Comment, CommentTarget, Criteria, Idea, Problem, User};

    pub const AUTHOR: i64 = 1;
    pub const CONTRIBUTOR: i64 = 2;
    pub const STRANGER: i64 = 3;
    pub const MANAGER: i64 = 4;

    pub fn user(id: i64) -> User {
        User::new(id, format!("user{}", id))
    }

    /// Published, open, public problem by AUTHOR with one contributor and
    /// one manager, one criteria and one idea
    pub fn problem() -> Problem {
        let mut p = Problem::new("Traffic".to_string(), AUTHOR, 1);
        p.contributors.insert(CONTRIBUTOR);
        p.managers.insert(MANAGER);
        p.criteria_count = 1;
        p.idea_count = 1;
        p
    }

    pub fn private_problem() -> Problem {
        let mut p = problem();
        p.public = false;
        p
    }

    pub fn criteria(problem: &Problem, author: i64) -> Criteria {
        Criteria::new("Cost".to_string(), problem.base.id, author, 1)
    }

    pub fn idea(problem: &Problem, author: i64) -> Idea {
        Idea::new("Bike lanes".to_string(), problem.base.id, author, 1)
    }

    pub fn alternative(problem: &Problem, author: i64) -> Alternative {
        Alternative::new("Plan A".to_string(), problem.base.id, author, 1)
    }

    pub fn comment(problem: &Problem, author: i64) -> Comment {
        Comment::new(
            "Agreed".to_string(),
            problem.base.id,
            CommentTarget::Idea(Uuid::new_v4()),
            author,
            1,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::fixtures::*;
    use super::*;

    fn targets<'a>(
        problem: &'a Problem,
        criteria: &'a Criteria,
        idea: &'a Idea,
        alternative: &'a Alternative,
        comment: &'a Comment,
    ) -> Vec<Target<'a>> {
        vec![
            Target::NewProblem,
            Target::Problem(problem),
            Target::Criteria { problem, criteria: Some(criteria) },
            Target::Idea { problem, idea: Some(idea) },
            Target::Alternative { problem, alternative: Some(alternative) },
            Target::Comment { problem, comment },
        ]
    }

    #[test]
    fn test_superuser_allowed_everything() {
        let mut problem = private_problem();
        problem.open = false;
        problem.published = false;
        problem.locked = true;
        problem.criteria_count = 0;
        problem.idea_count = 0;
        let criteria = criteria(&problem, AUTHOR);
        let idea = {
            let mut i = idea(&problem, AUTHOR);
            i.deleted_by = Some(AUTHOR);
            i
        };
        let alternative = alternative(&problem, AUTHOR);
        let comment = comment(&problem, AUTHOR);
        let admin = User::superuser(99, "admin");

        for target in targets(&problem, &criteria, &idea, &alternative, &comment) {
            for mode in Mode::supported_by(target.kind()) {
                if matches!(target, Target::NewProblem) && *mode != Mode::Create {
                    continue;
                }
                assert!(
                    authorize(&admin, *mode, &target).unwrap(),
                    "superuser denied {} on {}",
                    mode,
                    target.kind()
                );
            }
        }
    }

    #[test]
    fn test_public_problem_view_for_anonymous() {
        let anon = User::anonymous();
        let public = problem();
        assert!(authorize(&anon, Mode::View, &Target::Problem(&public)).unwrap());

        let private = private_problem();
        assert!(!authorize(&anon, Mode::View, &Target::Problem(&private)).unwrap());
    }

    #[test]
    fn test_anonymous_denied_everything_but_view() {
        let anon = User::anonymous();
        let problem = problem();
        for mode in Mode::supported_by(EntityKind::Problem) {
            let allowed = authorize(&anon, *mode, &Target::Problem(&problem)).unwrap();
            assert_eq!(allowed, *mode == Mode::View, "anonymous {}", mode);
        }
        assert!(!authorize(&anon, Mode::Create, &Target::NewProblem).unwrap());
    }

    #[test]
    fn test_private_open_problem_example() {
        let mut problem = Problem::new("P".to_string(), 1, 1);
        problem.public = false;
        problem.open = true;
        problem.contributors.insert(2);

        assert!(authorize(&user(2), Mode::Contribute, &Target::Problem(&problem)).unwrap());
        assert!(!authorize(&user(3), Mode::View, &Target::Problem(&problem)).unwrap());
    }

    #[test]
    fn test_unsupported_mode_is_an_error() {
        let problem = problem();
        let comment = comment(&problem, AUTHOR);
        let err = authorize(&user(AUTHOR), Mode::Vote, &Target::Comment { problem: &problem, comment: &comment });
        assert!(matches!(err, Err(IdeastormError::InvalidMode { .. })));

        // Superusers do not mask caller bugs
        let err = authorize(
            &User::superuser(9, "root"),
            Mode::Contribute,
            &Target::Idea { problem: &problem, idea: None },
        );
        assert!(matches!(err, Err(IdeastormError::InvalidMode { .. })));
    }

    #[test]
    fn test_parse_for() {
        assert_eq!(Mode::parse_for(EntityKind::Idea, "VOTE").unwrap(), Mode::Vote);
        assert!(matches!(
            Mode::parse_for(EntityKind::Criteria, "vote"),
            Err(IdeastormError::InvalidMode { .. })
        ));
        assert!(matches!(
            Mode::parse_for(EntityKind::Problem, "fly"),
            Err(IdeastormError::InvalidMode { .. })
        ));
    }

    #[test]
    fn test_ensure_maps_refusal_to_forbidden() {
        let problem = private_problem();
        let err = ensure(&user(STRANGER), Mode::View, &Target::Problem(&problem)).unwrap_err();
        assert!(matches!(err, IdeastormError::Forbidden { .. }));
        assert!(err.to_string().contains("Traffic"));
        assert!(ensure(&user(AUTHOR), Mode::Delete, &Target::Problem(&problem)).is_ok());
    }

    #[test]
    fn test_missing_object_is_invalid_argument() {
        let problem = problem();
        let err = authorize(&user(AUTHOR), Mode::Update, &Target::Idea { problem: &problem, idea: None });
        assert!(matches!(err, Err(IdeastormError::InvalidArgument(_))));
    }
}
