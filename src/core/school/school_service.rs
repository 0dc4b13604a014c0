// School service - keeps each guild's courses, classes and gradebooks.
//
// The Discord layer mirrors role changes into this model (addclass registers a
// group, expel removes a student, ...). Grades are only accepted for students
// that belong to the class they are graded in.

use super::school_models::{Course, GradeBook, GradeEntry, Group, School};
use crate::core::grading::Grade;
use async_trait::async_trait;
use chrono::Utc;
use dashmap::DashMap;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{Mutex, OwnedMutexGuard};

// ============================================================================
// ERRORS
// ============================================================================

#[derive(Debug, Error, PartialEq)]
pub enum SchoolError {
    #[error("There is no course named `{0}`")]
    UnknownCourse(String),

    #[error("There is no class named `{0}`")]
    UnknownGroup(String),

    #[error("A course named `{0}` already exists")]
    CourseExists(String),

    #[error("The course `{0}` is closed")]
    CourseClosed(String),

    #[error("<@{student_id}> is not in class `{group}`")]
    NotInGroup { student_id: u64, group: String },

    #[error("Class `{group}` is already supervised by <@{supervisor_id}>")]
    SupervisorTaken { group: String, supervisor_id: u64 },
}

// ============================================================================
// STORAGE TRAIT (PORT)
// ============================================================================

/// Persistence for whole-school aggregates, one per guild.
#[async_trait]
pub trait SchoolStore: Send + Sync {
    async fn load(&self, guild_id: u64) -> Result<Option<School>, SchoolError>;

    async fn save(&self, school: School) -> Result<(), SchoolError>;

    /// Returns whether a school was removed.
    async fn remove(&self, guild_id: u64) -> Result<bool, SchoolError>;
}

// ============================================================================
// CORE SERVICE
// ============================================================================

/// Mutations load a whole `School`, change it and save it back, so each one
/// holds its guild's lock for the full cycle.
pub struct SchoolService<S: SchoolStore> {
    store: S,
    guild_locks: DashMap<u64, Arc<Mutex<()>>>,
}

impl<S: SchoolStore> SchoolService<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            guild_locks: DashMap::new(),
        }
    }

    async fn lock_guild(&self, guild_id: u64) -> OwnedMutexGuard<()> {
        let lock = Arc::clone(&self.guild_locks.entry(guild_id).or_default());
        lock.lock_owned().await
    }

    async fn load_or_new(&self, guild_id: u64, guild_name: &str) -> Result<School, SchoolError> {
        Ok(self
            .store
            .load(guild_id)
            .await?
            .unwrap_or_else(|| School::new(guild_id, guild_name)))
    }

    async fn load_existing(&self, guild_id: u64) -> Result<Option<School>, SchoolError> {
        self.store.load(guild_id).await
    }

    /// Snapshot of a guild's school, if one was ever created.
    pub async fn school(&self, guild_id: u64) -> Result<Option<School>, SchoolError> {
        self.load_existing(guild_id).await
    }

    // ------------------------------------------------------------------------
    // Classes
    // ------------------------------------------------------------------------

    /// Create the class if needed and add the given students to it.
    pub async fn register_group(
        &self,
        guild_id: u64,
        guild_name: &str,
        group: &str,
        student_ids: &[u64],
    ) -> Result<Group, SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let mut school = self.load_or_new(guild_id, guild_name).await?;
        let entry = school
            .groups
            .entry(group.to_string())
            .or_insert_with(|| Group::new(group));
        entry.student_ids.extend(student_ids.iter().copied());
        let snapshot = entry.clone();

        self.store.save(school).await?;
        tracing::info!(guild_id, group, students = student_ids.len(), "Class registered");
        Ok(snapshot)
    }

    /// Make `teacher_id` the supervisor of a class.
    ///
    /// Fails if a different teacher already supervises it. The class is
    /// created when missing, since the Discord role is the source of truth.
    pub async fn set_supervisor(
        &self,
        guild_id: u64,
        guild_name: &str,
        group: &str,
        teacher_id: u64,
    ) -> Result<(), SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let mut school = self.load_or_new(guild_id, guild_name).await?;
        let entry = school
            .groups
            .entry(group.to_string())
            .or_insert_with(|| Group::new(group));

        match entry.supervisor_id {
            Some(current) if current != teacher_id => {
                return Err(SchoolError::SupervisorTaken {
                    group: group.to_string(),
                    supervisor_id: current,
                });
            }
            _ => entry.supervisor_id = Some(teacher_id),
        }

        self.store.save(school).await
    }

    /// Remove a teacher from every class they supervise. Returns those classes.
    pub async fn clear_supervisor(
        &self,
        guild_id: u64,
        teacher_id: u64,
    ) -> Result<Vec<String>, SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let Some(mut school) = self.load_existing(guild_id).await? else {
            return Ok(Vec::new());
        };

        let mut cleared = Vec::new();
        for group in school.groups.values_mut() {
            if group.supervisor_id == Some(teacher_id) {
                group.supervisor_id = None;
                cleared.push(group.name.clone());
            }
        }

        self.store.save(school).await?;
        Ok(cleared)
    }

    /// Delete a class and its gradebooks. Returns false if it did not exist.
    pub async fn remove_group(&self, guild_id: u64, group: &str) -> Result<bool, SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let Some(mut school) = self.load_existing(guild_id).await? else {
            return Ok(false);
        };

        let existed = school.groups.remove(group).is_some();
        for course in school.courses.values_mut() {
            course.gradebooks.remove(group);
        }

        self.store.save(school).await?;
        Ok(existed)
    }

    /// Drop a student from every class, course and gradebook.
    pub async fn expel_student(&self, guild_id: u64, student_id: u64) -> Result<(), SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let Some(mut school) = self.load_existing(guild_id).await? else {
            return Ok(());
        };

        for group in school.groups.values_mut() {
            group.student_ids.remove(&student_id);
        }
        for course in school.courses.values_mut() {
            course.student_ids.remove(&student_id);
            for book in course.gradebooks.values_mut() {
                book.remove_student(student_id);
            }
        }

        self.store.save(school).await?;
        tracing::info!(guild_id, student_id, "Student expelled");
        Ok(())
    }

    /// Forget everything about a guild's school.
    pub async fn clear(&self, guild_id: u64) -> Result<bool, SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        self.store.remove(guild_id).await
    }

    // ------------------------------------------------------------------------
    // Courses
    // ------------------------------------------------------------------------

    pub async fn create_course(
        &self,
        guild_id: u64,
        guild_name: &str,
        name: &str,
        description: &str,
        teacher_id: u64,
    ) -> Result<Course, SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let mut school = self.load_or_new(guild_id, guild_name).await?;
        if school.courses.contains_key(name) {
            return Err(SchoolError::CourseExists(name.to_string()));
        }

        let mut course = Course::new(name, description, Utc::now());
        course.teacher_ids.insert(teacher_id);
        school.courses.insert(name.to_string(), course.clone());

        self.store.save(school).await?;
        Ok(course)
    }

    pub async fn courses(&self, guild_id: u64) -> Result<Vec<Course>, SchoolError> {
        Ok(self
            .load_existing(guild_id)
            .await?
            .map(|school| school.courses.into_values().collect())
            .unwrap_or_default())
    }

    /// Add a user to a course as a teacher or a student.
    pub async fn enroll(
        &self,
        guild_id: u64,
        course: &str,
        user_id: u64,
        as_teacher: bool,
    ) -> Result<(), SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let mut school = self.require_school(guild_id, course).await?;
        let entry = school
            .courses
            .get_mut(course)
            .ok_or_else(|| SchoolError::UnknownCourse(course.to_string()))?;

        if as_teacher {
            entry.teacher_ids.insert(user_id);
        } else {
            entry.student_ids.insert(user_id);
        }

        self.store.save(school).await
    }

    pub async fn close_course(&self, guild_id: u64, course: &str) -> Result<(), SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let mut school = self.require_school(guild_id, course).await?;
        let entry = school
            .courses
            .get_mut(course)
            .ok_or_else(|| SchoolError::UnknownCourse(course.to_string()))?;

        if entry.end_date.is_none() {
            entry.end_date = Some(Utc::now());
        }

        self.store.save(school).await
    }

    // ------------------------------------------------------------------------
    // Grades
    // ------------------------------------------------------------------------

    /// Append a grade, given on a scale of `scale_limit`, to a student's record
    /// in `course` for `group`.
    pub async fn record_grade(
        &self,
        guild_id: u64,
        course: &str,
        group: &str,
        student_id: u64,
        grade: Grade,
        scale_limit: u32,
        recorded_by: u64,
    ) -> Result<(), SchoolError> {
        let _guard = self.lock_guild(guild_id).await;
        let mut school = self.require_school(guild_id, course).await?;

        let in_group = school
            .groups
            .get(group)
            .ok_or_else(|| SchoolError::UnknownGroup(group.to_string()))?
            .student_ids
            .contains(&student_id);
        if !in_group {
            return Err(SchoolError::NotInGroup {
                student_id,
                group: group.to_string(),
            });
        }

        let entry = school
            .courses
            .get_mut(course)
            .ok_or_else(|| SchoolError::UnknownCourse(course.to_string()))?;
        if entry.is_closed() {
            return Err(SchoolError::CourseClosed(course.to_string()));
        }

        entry.student_ids.insert(student_id);
        entry
            .gradebooks
            .entry(group.to_string())
            .or_insert_with(|| GradeBook::new(course, group))
            .record(
                student_id,
                GradeEntry {
                    grade,
                    scale_limit,
                    recorded_by,
                    recorded_at: Utc::now(),
                },
            );

        self.store.save(school).await?;
        tracing::info!(guild_id, course, group, student_id, "Grade recorded");
        Ok(())
    }

    /// Every grade a student has in a course, grouped by class.
    pub async fn student_grades(
        &self,
        guild_id: u64,
        course: &str,
        student_id: u64,
    ) -> Result<Vec<(String, Vec<GradeEntry>)>, SchoolError> {
        let school = self.require_school(guild_id, course).await?;
        let entry = school
            .courses
            .get(course)
            .ok_or_else(|| SchoolError::UnknownCourse(course.to_string()))?;

        Ok(entry
            .gradebooks
            .values()
            .filter_map(|book| {
                let grades = book.grades_of(student_id);
                (!grades.is_empty()).then(|| (book.group.clone(), grades.to_vec()))
            })
            .collect())
    }

    /// All gradebooks of a course.
    pub async fn gradebooks(&self, guild_id: u64, course: &str) -> Result<Vec<GradeBook>, SchoolError> {
        let school = self.require_school(guild_id, course).await?;
        let entry = school
            .courses
            .get(course)
            .ok_or_else(|| SchoolError::UnknownCourse(course.to_string()))?;
        Ok(entry.gradebooks.values().cloned().collect())
    }

    /// Load a school for an operation on `course`; no school means no course.
    async fn require_school(&self, guild_id: u64, course: &str) -> Result<School, SchoolError> {
        self.load_existing(guild_id)
            .await?
            .ok_or_else(|| SchoolError::UnknownCourse(course.to_string()))
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use dashmap::DashMap;

    /// In-memory store for testing
    struct MockSchoolStore {
        schools: DashMap<u64, School>,
    }

    impl MockSchoolStore {
        fn new() -> Self {
            Self {
                schools: DashMap::new(),
            }
        }
    }

    #[async_trait]
    impl SchoolStore for MockSchoolStore {
        async fn load(&self, guild_id: u64) -> Result<Option<School>, SchoolError> {
            let school = self.schools.get(&guild_id).map(|s| s.clone());
            // Give other tasks a chance to run between load and save.
            tokio::task::yield_now().await;
            Ok(school)
        }

        async fn save(&self, school: School) -> Result<(), SchoolError> {
            self.schools.insert(school.guild_id, school);
            Ok(())
        }

        async fn remove(&self, guild_id: u64) -> Result<bool, SchoolError> {
            Ok(self.schools.remove(&guild_id).is_some())
        }
    }

    const GUILD: u64 = 456;

    async fn seeded() -> SchoolService<MockSchoolStore> {
        let service = SchoolService::new(MockSchoolStore::new());
        service
            .register_group(GUILD, "Test School", "7A", &[1, 2])
            .await
            .unwrap();
        service
            .create_course(GUILD, "Test School", "Maths", "Numbers", 100)
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_register_group_merges_students() {
        let service = seeded().await;
        let group = service
            .register_group(GUILD, "Test School", "7A", &[2, 3])
            .await
            .unwrap();
        assert_eq!(group.student_ids.into_iter().collect::<Vec<_>>(), vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_supervisor_is_unique() {
        let service = seeded().await;
        service.set_supervisor(GUILD, "Test School", "7A", 100).await.unwrap();
        // same teacher again is fine
        service.set_supervisor(GUILD, "Test School", "7A", 100).await.unwrap();

        let err = service
            .set_supervisor(GUILD, "Test School", "7A", 101)
            .await
            .unwrap_err();
        assert_eq!(
            err,
            SchoolError::SupervisorTaken {
                group: "7A".to_string(),
                supervisor_id: 100
            }
        );

        let cleared = service.clear_supervisor(GUILD, 100).await.unwrap();
        assert_eq!(cleared, vec!["7A".to_string()]);
        service.set_supervisor(GUILD, "Test School", "7A", 101).await.unwrap();
    }

    #[tokio::test]
    async fn test_record_requires_membership() {
        let service = seeded().await;

        let err = service
            .record_grade(GUILD, "Maths", "7A", 9, Grade::new(5.0, 10), 10, 100)
            .await
            .unwrap_err();
        assert!(matches!(err, SchoolError::NotInGroup { student_id: 9, .. }));

        let err = service
            .record_grade(GUILD, "Maths", "8B", 1, Grade::new(5.0, 10), 10, 100)
            .await
            .unwrap_err();
        assert_eq!(err, SchoolError::UnknownGroup("8B".to_string()));

        let err = service
            .record_grade(GUILD, "History", "7A", 1, Grade::new(5.0, 10), 10, 100)
            .await
            .unwrap_err();
        assert_eq!(err, SchoolError::UnknownCourse("History".to_string()));
    }

    #[tokio::test]
    async fn test_record_and_read_back() {
        let service = seeded().await;
        service
            .record_grade(GUILD, "Maths", "7A", 1, Grade::new(8.0, 10), 10, 100)
            .await
            .unwrap();
        service
            .record_grade(GUILD, "Maths", "7A", 1, Grade::special(), 10, 100)
            .await
            .unwrap();

        let grades = service.student_grades(GUILD, "Maths", 1).await.unwrap();
        assert_eq!(grades.len(), 1);
        let (group, entries) = &grades[0];
        assert_eq!(group, "7A");
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].grade.magnitude(), 8.0);
        assert!(entries[1].grade.is_special());

        let courses = service.courses(GUILD).await.unwrap();
        assert!(courses[0].student_ids.contains(&1));
    }

    #[tokio::test]
    async fn test_closed_course_rejects_grades() {
        let service = seeded().await;
        service.close_course(GUILD, "Maths").await.unwrap();
        let err = service
            .record_grade(GUILD, "Maths", "7A", 1, Grade::new(8.0, 10), 10, 100)
            .await
            .unwrap_err();
        assert_eq!(err, SchoolError::CourseClosed("Maths".to_string()));
    }

    #[tokio::test]
    async fn test_duplicate_course_rejected() {
        let service = seeded().await;
        let err = service
            .create_course(GUILD, "Test School", "Maths", "", 100)
            .await
            .unwrap_err();
        assert_eq!(err, SchoolError::CourseExists("Maths".to_string()));
    }

    #[tokio::test]
    async fn test_expel_removes_student_everywhere() {
        let service = seeded().await;
        service.enroll(GUILD, "Maths", 2, false).await.unwrap();
        service
            .record_grade(GUILD, "Maths", "7A", 2, Grade::new(4.0, 10), 10, 100)
            .await
            .unwrap();

        service.expel_student(GUILD, 2).await.unwrap();

        let school = service.school(GUILD).await.unwrap().unwrap();
        assert!(!school.groups["7A"].student_ids.contains(&2));
        assert!(!school.courses["Maths"].student_ids.contains(&2));
        assert!(service.student_grades(GUILD, "Maths", 2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_remove_group_and_clear() {
        let service = seeded().await;
        service
            .record_grade(GUILD, "Maths", "7A", 1, Grade::new(4.0, 10), 10, 100)
            .await
            .unwrap();

        assert!(service.remove_group(GUILD, "7A").await.unwrap());
        assert!(!service.remove_group(GUILD, "7A").await.unwrap());
        assert!(service.gradebooks(GUILD, "Maths").await.unwrap().is_empty());

        assert!(service.clear(GUILD).await.unwrap());
        assert!(service.school(GUILD).await.unwrap().is_none());
        assert!(service.courses(GUILD).await.unwrap().is_empty());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 8)]
    async fn test_concurrent_updates_are_not_lost() {
        let service = Arc::new(SchoolService::new(MockSchoolStore::new()));

        let mut handles = Vec::new();
        for i in 0..400u64 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                service
                    .register_group(GUILD, "Test School", &format!("C{}", i), &[i])
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let school = service.school(GUILD).await.unwrap().unwrap();
        assert_eq!(school.groups.len(), 400);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_grades_all_recorded() {
        let service = Arc::new(seeded().await);

        let mut handles = Vec::new();
        for i in 0..100 {
            let service = Arc::clone(&service);
            handles.push(tokio::spawn(async move {
                let student = if i % 2 == 0 { 1 } else { 2 };
                service
                    .record_grade(GUILD, "Maths", "7A", student, Grade::new(5.0, 10), 10, 100)
                    .await
                    .unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        let books = service.gradebooks(GUILD, "Maths").await.unwrap();
        let total: usize = books[0].entries().map(|(_, grades)| grades.len()).sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_errors_read_as_replies() {
        // Every variant is shown to the user as-is.
        let cases = [
            (SchoolError::UnknownCourse("Maths".into()), "There is no course named `Maths`"),
            (SchoolError::UnknownGroup("7A".into()), "There is no class named `7A`"),
            (SchoolError::CourseExists("Maths".into()), "A course named `Maths` already exists"),
            (SchoolError::CourseClosed("Maths".into()), "The course `Maths` is closed"),
            (
                SchoolError::NotInGroup {
                    student_id: 9,
                    group: "7A".into(),
                },
                "<@9> is not in class `7A`",
            ),
            (
                SchoolError::SupervisorTaken {
                    group: "7A".into(),
                    supervisor_id: 100,
                },
                "Class `7A` is already supervised by <@100>",
            ),
        ];
        for (error, text) in cases {
            assert_eq!(error.to_string(), text);
        }
    }
}
