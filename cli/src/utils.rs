//! Markdown import, argument parsing and prompts.

use std::io::{self, BufRead, Write};

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use gray_matter::{engine::YAML, Matter};
use hlc_shared::{content::markdown_to_html, Article, ArticleContent, Category};
use serde::Deserialize;

/// YAML front matter of an imported Markdown draft.
#[derive(Debug, Default, Deserialize)]
pub struct Frontmatter {
    /// Headline.
    pub title: Option<String>,
    /// URL slug.
    pub slug: Option<String>,
    /// Summary.
    #[serde(alias = "summary")]
    pub excerpt: Option<String>,
    /// Tags.
    pub tags: Option<Vec<String>>,
    /// Section name.
    pub category: Option<String>,
    /// Byline.
    pub author: Option<String>,
    /// Display date.
    pub date: Option<String>,
    /// Cover image URL.
    #[serde(alias = "featured_image")]
    pub image: Option<String>,
    /// Cover image caption.
    pub image_caption: Option<String>,
    /// Pin to the front page.
    #[serde(default)]
    pub featured: bool,
}

impl Frontmatter {
    /// Applies the fields present in the front matter to `article` and
    /// replaces its body with `body` rendered to sanitized HTML.
    pub fn apply(self, article: &mut Article, body: &str) -> Result<()> {
        if let Some(raw) = self.category.as_deref() {
            article.category = Category::parse(raw)
                .with_context(|| format!("unknown category `{raw}` (expected blog, interviews or reviews)"))?;
        }
        if let Some(title) = self.title {
            article.title = title;
        }
        if let Some(slug) = self.slug {
            article.slug = slug;
        }
        if let Some(excerpt) = self.excerpt {
            article.excerpt = excerpt;
        }
        if let Some(tags) = self.tags {
            article.tags = tags;
        }
        if let Some(author) = self.author {
            article.author = author;
        }
        if let Some(date) = self.date {
            article.date = date;
        }
        if let Some(image) = self.image.filter(|value| !value.trim().is_empty()) {
            article.image = Some(image);
        }
        if let Some(caption) = self.image_caption.filter(|value| !value.trim().is_empty()) {
            article.image_caption = Some(caption);
        }
        article.featured = article.featured || self.featured;
        article.content = ArticleContent::Html(markdown_to_html(body));
        Ok(())
    }
}

/// Splits `content` into front matter and Markdown body.
pub fn parse_markdown(content: &str) -> Result<(Frontmatter, String)> {
    let matter = Matter::<YAML>::new();
    let parsed = matter.parse(content);

    let frontmatter = parsed
        .data
        .map(|data| data.deserialize::<Frontmatter>())
        .transpose()?
        .unwrap_or_default();

    Ok((frontmatter, parsed.content))
}

/// Comma-separated list, trimmed, empties dropped.
pub fn parse_tags(tags: &str) -> Vec<String> {
    tags.split(',')
        .map(|tag| tag.trim())
        .filter(|tag| !tag.is_empty())
        .map(|tag| tag.to_string())
        .collect()
}

/// Accepts RFC 3339, `YYYY-MM-DD HH:MM[:SS]` or `YYYY-MM-DDTHH:MM` in UTC,
/// or a bare date meaning midnight UTC.
pub fn parse_schedule_time(raw: &str) -> Result<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(at) = DateTime::parse_from_rfc3339(raw) {
        return Ok(at.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M", "%Y-%m-%dT%H:%M"] {
        if let Ok(at) = NaiveDateTime::parse_from_str(raw, format) {
            return Ok(at.and_utc());
        }
    }
    let date = NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .with_context(|| format!("unrecognised date `{raw}`"))?;
    date.and_hms_opt(0, 0, 0)
        .map(|at| at.and_utc())
        .with_context(|| format!("unrecognised date `{raw}`"))
}

/// Last path segment of a URL, without query or fragment.
pub fn filename_from_url(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/')
        .rsplit('/')
        .next()
        .filter(|segment| !segment.is_empty())
        .unwrap_or("asset")
        .to_string()
}

/// Prints `prompt` and reads a yes/no answer from `input`. Anything other
/// than `y` or `yes` declines.
pub fn confirm_with(prompt: &str, input: &mut impl BufRead, output: &mut impl Write) -> Result<bool> {
    write!(output, "{prompt} [y/N] ")?;
    output.flush()?;
    let mut answer = String::new();
    input.read_line(&mut answer)?;
    Ok(matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"))
}

/// Interactive confirmation on stdin unless `assume_yes`.
pub fn confirm(prompt: &str, assume_yes: bool) -> Result<bool> {
    if assume_yes {
        return Ok(true);
    }
    confirm_with(prompt, &mut io::stdin().lock(), &mut io::stdout())
}
