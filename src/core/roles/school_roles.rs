// School role conventions.
//
// The school lives on Discord as plain roles:
//   "Teacher" / "Student"      - global school roles
//   "[Class] <name>"           - one role per class
//   "<name>-teacher"           - the class supervisor, at most one holder
// This module only knows about role *names*; the Discord layer resolves them.

pub const TEACHER_ROLE: &str = "Teacher";
pub const STUDENT_ROLE: &str = "Student";
pub const CLASS_ROLE_PREFIX: &str = "[Class] ";
pub const SUPERVISOR_ROLE_SUFFIX: &str = "-teacher";

/// Category that holds the per-class text channels.
pub const CLASS_CATEGORY: &str = "classes";

/// Shown in roster sections nobody falls into.
pub const EMPTY_SECTION: &str = "No members :person_shrugging:";

/// Accept either `7A` or `[Class] 7A` and return `7A`.
pub fn normalize_class_name(input: &str) -> &str {
    let trimmed = input.trim();
    trimmed
        .strip_prefix(CLASS_ROLE_PREFIX)
        .map(str::trim)
        .unwrap_or(trimmed)
}

pub fn class_role_name(class: &str) -> String {
    format!("{}{}", CLASS_ROLE_PREFIX, normalize_class_name(class))
}

pub fn supervisor_role_name(class: &str) -> String {
    format!("{}{}", normalize_class_name(class), SUPERVISOR_ROLE_SUFFIX)
}

/// Text channel name for a class: lowercase, dash separated.
pub fn class_channel_name(class: &str) -> String {
    normalize_class_name(class)
        .split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

pub fn is_class_role(role_name: &str) -> bool {
    role_name.starts_with(CLASS_ROLE_PREFIX.trim_end())
}

pub fn is_supervisor_role(role_name: &str) -> bool {
    role_name.ends_with(SUPERVISOR_ROLE_SUFFIX)
}

/// Roles taken away when a student is expelled.
pub fn is_enrollment_role(role_name: &str) -> bool {
    is_class_role(role_name) || role_name == STUDENT_ROLE
}

/// Roles taken away when a teacher stops supervising.
pub fn is_supervision_role(role_name: &str) -> bool {
    is_class_role(role_name) || is_supervisor_role(role_name)
}

/// Every role `clearschool` deletes.
pub fn is_school_role(role_name: &str) -> bool {
    role_name == TEACHER_ROLE || role_name == STUDENT_ROLE || is_supervision_role(role_name)
}

// ============================================================================
// ROSTER
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RosterSection {
    Administrators,
    Teachers,
    Students,
    Others,
}

impl RosterSection {
    pub fn title(&self) -> &'static str {
        match self {
            RosterSection::Administrators => ":a: Administrators",
            RosterSection::Teachers => ":teacher: Teachers",
            RosterSection::Students => ":student: Students",
            RosterSection::Others => ":eyes: Other members",
        }
    }
}

/// Administrators first, then teachers, then students.
pub fn classify_member<'a>(
    is_administrator: bool,
    role_names: impl IntoIterator<Item = &'a str>,
) -> RosterSection {
    if is_administrator {
        return RosterSection::Administrators;
    }

    let mut section = RosterSection::Others;
    for name in role_names {
        if name == TEACHER_ROLE {
            return RosterSection::Teachers;
        }
        if name == STUDENT_ROLE {
            section = RosterSection::Students;
        }
    }
    section
}

/// Members of a voice channel sorted into roster sections.
#[derive(Debug, Default)]
pub struct Roster {
    administrators: Vec<String>,
    teachers: Vec<String>,
    students: Vec<String>,
    others: Vec<String>,
}

impl Roster {
    pub fn push(&mut self, section: RosterSection, mention: String) {
        match section {
            RosterSection::Administrators => self.administrators.push(mention),
            RosterSection::Teachers => self.teachers.push(mention),
            RosterSection::Students => self.students.push(mention),
            RosterSection::Others => self.others.push(mention),
        }
    }

    /// (title, body) pairs in display order; empty sections get a placeholder.
    pub fn sections(&self) -> Vec<(&'static str, String)> {
        [
            (RosterSection::Administrators, &self.administrators),
            (RosterSection::Teachers, &self.teachers),
            (RosterSection::Students, &self.students),
            (RosterSection::Others, &self.others),
        ]
        .into_iter()
        .map(|(section, members)| {
            let body = if members.is_empty() {
                EMPTY_SECTION.to_string()
            } else {
                members.join("\n")
            };
            (section.title(), body)
        })
        .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_class_names() {
        assert_eq!(class_role_name("7A"), "[Class] 7A");
        assert_eq!(class_role_name("[Class] 7A"), "[Class] 7A");
        assert_eq!(supervisor_role_name("7A"), "7A-teacher");
        assert_eq!(supervisor_role_name(" [Class] 7A "), "7A-teacher");
        assert_eq!(class_channel_name("Year 7 A"), "year-7-a");
    }

    #[test]
    fn test_role_predicates() {
        assert!(is_enrollment_role("[Class] 7A"));
        assert!(is_enrollment_role("Student"));
        assert!(!is_enrollment_role("Teacher"));
        assert!(!is_enrollment_role("7A-teacher"));

        assert!(is_supervision_role("7A-teacher"));
        assert!(is_supervision_role("[Class] 7A"));
        assert!(!is_supervision_role("Student"));

        for name in ["Teacher", "Student", "[Class] 7A", "7A-teacher"] {
            assert!(is_school_role(name), "{name} should be a school role");
        }
        assert!(!is_school_role("Moderator"));
        assert!(!is_school_role("@everyone"));
    }

    #[test]
    fn test_classify_member() {
        assert_eq!(
            classify_member(true, ["Student"]),
            RosterSection::Administrators
        );
        assert_eq!(
            classify_member(false, ["Student", "Teacher"]),
            RosterSection::Teachers
        );
        assert_eq!(classify_member(false, ["Student"]), RosterSection::Students);
        assert_eq!(classify_member(false, ["Gamer"]), RosterSection::Others);
        assert_eq!(
            classify_member(false, Vec::<&str>::new()),
            RosterSection::Others
        );
    }

    #[test]
    fn test_roster_placeholders() {
        let mut roster = Roster::default();
        roster.push(RosterSection::Students, "<@1>".to_string());
        roster.push(RosterSection::Students, "<@2>".to_string());

        let sections = roster.sections();
        assert_eq!(sections.len(), 4);
        assert_eq!(sections[0].1, EMPTY_SECTION);
        assert_eq!(sections[2], (":student: Students", "<@1>\n<@2>".to_string()));
    }
}
