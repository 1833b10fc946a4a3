//! `write-draft`.

use std::{fs, path::Path, path::PathBuf};

use anyhow::{Context, Result};
use hlc_shared::{dashboard::Notice, Article, ArticleContent, Category};

use super::{open_lifecycle, report};
use crate::utils::{parse_markdown, parse_tags};

/// Inputs of `write-draft`.
pub struct DraftOptions {
    /// Markdown file with optional front matter.
    pub file: Option<PathBuf>,
    /// Existing article to update.
    pub id: Option<String>,
    /// Title override.
    pub title: Option<String>,
    /// Raw HTML body, used without a file.
    pub content: Option<String>,
    /// Comma-separated tags override.
    pub tags: Option<String>,
    /// Section override.
    pub category: Option<String>,
    /// Byline override.
    pub author: Option<String>,
}

/// Saves the draft described by `options`.
pub fn run(db_path: &Path, options: DraftOptions) -> Result<()> {
    let mut lifecycle = open_lifecycle(db_path)?;

    // Updating an article keeps everything the options leave out.
    let base = match options.id.as_deref() {
        Some(id) => match lifecycle.store().find(id) {
            Some((status, existing)) => {
                tracing::info!(id, %status, "updating existing article as draft");
                existing.clone()
            },
            None => {
                let mut article = Article::new(String::new(), ArticleContent::default());
                article.id = id.to_string();
                article
            },
        },
        None => Article::new(String::new(), ArticleContent::default()),
    };
    let article = build_article(&options, base)?;

    match lifecycle.save_draft(article) {
        Ok(saved) => {
            report(Notice::success(format!("Draft \"{}\" saved", saved.title)))?;
            println!("  id:   {}", saved.id);
            println!("  slug: {}", saved.slug);
            Ok(())
        },
        Err(err) => report(Notice::from(&err)),
    }
}

fn build_article(options: &DraftOptions, mut article: Article) -> Result<Article> {
    if let Some(file) = &options.file {
        let raw = fs::read_to_string(file)
            .with_context(|| format!("failed to read markdown file {}", file.display()))?;
        let (frontmatter, body) = parse_markdown(&raw)?;
        frontmatter.apply(&mut article, &body)?;
        if article.title.trim().is_empty() {
            article.title = file
                .file_stem()
                .and_then(|stem| stem.to_str())
                .unwrap_or_default()
                .replace(['-', '_'], " ");
        }
    } else if let Some(content) = &options.content {
        article.content = ArticleContent::Html(content.clone());
    }

    if let Some(title) = &options.title {
        article.title = title.clone();
    }
    if let Some(tags) = &options.tags {
        article.tags = parse_tags(tags);
    }
    if let Some(raw) = &options.category {
        article.category = Category::parse(raw).with_context(|| format!("unknown category `{raw}`"))?;
    }
    if let Some(author) = &options.author {
        article.author = author.clone();
    }
    Ok(article)
}
