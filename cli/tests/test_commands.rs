#[cfg(test)]
mod tests {
    use std::{fs, path::Path};

    use hlc_cli::{
        cli::MediaCommand,
        commands::{backup, init, media, transition, write_draft},
    };
    use hlc_shared::{
        content_store::ContentStore, local_store::LocalStore, ArticleStatus, Category,
    };
    use tempfile::TempDir;

    fn store(db: &Path) -> ContentStore {
        ContentStore::load(LocalStore::open(db).expect("open")).expect("load")
    }

    fn draft_options(file: Option<std::path::PathBuf>) -> write_draft::DraftOptions {
        write_draft::DraftOptions {
            file,
            id: None,
            title: None,
            content: None,
            tags: None,
            category: None,
            author: None,
        }
    }

    #[test]
    fn markdown_draft_can_be_published_with_confirmation_flag() {
        let dir = TempDir::new().expect("temp dir");
        let db = dir.path().join("data").join("hlc.sqlite3");
        let md = dir.path().join("prozac.md");
        fs::write(
            &md,
            "---\ntitle: Should Hamlet Take Prozac\ncategory: interviews\ntags: [drama]\n---\n\nTo be.\n",
        )
        .expect("write markdown");

        init::run(&db).expect("init");
        write_draft::run(&db, draft_options(Some(md))).expect("write draft");
        let drafts = store(&db).partition(ArticleStatus::Draft).to_vec();
        assert_eq!(drafts.len(), 1);
        assert_eq!(drafts[0].category, Category::Interviews);
        assert_eq!(drafts[0].slug, "should-hamlet-take-prozac");

        transition::publish(&db, None, Some("should hamlet take prozac".to_string()), true)
            .expect("publish");
        let store = store(&db);
        assert!(store.partition(ArticleStatus::Draft).is_empty());
        assert_eq!(store.partition(ArticleStatus::Published).len(), 1);

        // Already published: nothing left to match.
        assert!(transition::publish(&db, None, Some("Should Hamlet Take Prozac".to_string()), true).is_err());
    }

    #[test]
    fn write_draft_requires_content() {
        let dir = TempDir::new().expect("temp dir");
        let db = dir.path().join("hlc.sqlite3");
        let mut options = draft_options(None);
        options.title = Some("Empty".to_string());
        assert!(write_draft::run(&db, options).is_err());
        assert!(store(&db).partition(ArticleStatus::Draft).is_empty());
    }

    #[test]
    fn delete_with_yes_removes_the_article() {
        let dir = TempDir::new().expect("temp dir");
        let db = dir.path().join("hlc.sqlite3");
        let mut options = draft_options(None);
        options.title = Some("Ephemeral".to_string());
        options.content = Some("<p>gone soon</p>".to_string());
        write_draft::run(&db, options).expect("draft");
        let id = store(&db).partition(ArticleStatus::Draft)[0].id.clone();

        transition::delete(&db, &id, ArticleStatus::Draft, true).expect("delete");
        assert!(store(&db).partition(ArticleStatus::Draft).is_empty());
    }

    #[test]
    fn backup_and_restore_round_trip() {
        let dir = TempDir::new().expect("temp dir");
        let db = dir.path().join("hlc.sqlite3");
        let snapshot = dir.path().join("backups").join("snapshot.json");

        let mut options = draft_options(None);
        options.title = Some("Keep me".to_string());
        options.content = Some("<p>x</p>".to_string());
        write_draft::run(&db, options).expect("draft");
        media::run(
            &db,
            MediaCommand::Add {
                url: "https://cdn.example.org/a.png".to_string(),
                filename: None,
                alt: String::new(),
            },
        )
        .expect("media");

        backup::backup(&db, &snapshot, false).expect("backup");
        assert!(snapshot.exists());
        let schedule = LocalStore::open(&db)
            .expect("open")
            .read_backup_schedule()
            .expect("schedule");
        assert!(schedule.last_backup_at.is_some());

        let restored_db = dir.path().join("restored.sqlite3");
        backup::restore(&restored_db, &snapshot, true).expect("restore");
        let restored = LocalStore::open(&restored_db).expect("open restored");
        assert_eq!(restored.read_partition(ArticleStatus::Draft).expect("drafts").len(), 1);
        assert_eq!(restored.read_media_index().expect("media")[0].filename, "a.png");
    }

    #[test]
    fn schedule_then_publish_due() {
        let dir = TempDir::new().expect("temp dir");
        let db = dir.path().join("hlc.sqlite3");
        let mut options = draft_options(None);
        options.title = Some("Tomorrow's Essay".to_string());
        options.content = Some("<p>x</p>".to_string());
        write_draft::run(&db, options).expect("draft");
        let id = store(&db).partition(ArticleStatus::Draft)[0].id.clone();

        transition::schedule(&db, &id, "2999-01-01").expect("schedule");
        transition::publish_due(&db).expect("publish due");
        let store = store(&db);
        assert_eq!(store.partitions_of(&id), vec![ArticleStatus::Scheduled]);
        assert!(store.partition(ArticleStatus::Published).is_empty());
    }
}
