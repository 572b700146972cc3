//! Streams a report form into a per-request temporary directory.
//!
//! Workbook parts are written to disk under a fresh uuid name (only the
//! extension of the client's file name is kept). Image parts and text fields
//! are buffered in memory. `positive_links` / `negative_links` carry JSON
//! arrays of post links; the n-th post of a polarity falls back to the n-th
//! entry when it has no `*_post_link_<i>` of its own. The byte budget covers
//! every part of the request;
//! the temporary directory is removed when the [`ReportUpload`] is dropped.

use crate::error::ReportError;
use crate::render::{HighlightedPost, RenderAssets};
use crate::report::sources::{SourceSet, COMBINED_SOURCES, ENGAGEMENT_SOURCES};
use crate::sources::load_workbook;
use actix_multipart::{Field, Multipart};
use chrono::NaiveDate;
use common::requests::ReportParameters;
use futures_util::StreamExt;
use log::{debug, warn};
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use tempfile::TempDir;
use uuid::Uuid;

const WORKBOOK_FIELD: &str = "excel_files";
const COMPANY_LOGO_FIELD: &str = "company_logo";
const AGENCY_LOGO_FIELDS: [&str; 2] = ["mediaeye_logo", "neurotime_logo"];
const COMPETITOR_LOGOS_FIELD: &str = "competitor_logos";
const TEXT_FIELDS: [&str; 4] = ["company_name", "start_date", "end_date", "has_competitors"];
const LINK_LIST_FIELDS: [&str; 2] = ["positive_links", "negative_links"];

static POST_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(positive|negative)_post_(image|link)_(\d+)$").expect("post field pattern compiles")
});

/// A workbook saved to disk, keyed by the stem of its uploaded file name.
#[derive(Debug, Clone)]
pub struct UploadedWorkbook {
    pub source: String,
    pub path: PathBuf,
}

#[derive(Debug, Default)]
struct PostSlot {
    image: Option<Vec<u8>>,
    link: Option<String>,
}

/// Everything a report form carried.
#[derive(Debug)]
pub struct ReportUpload {
    _dir: TempDir,
    pub workbooks: Vec<UploadedWorkbook>,
    pub assets: RenderAssets,
    fields: HashMap<String, String>,
    pub total_bytes: usize,
}

impl ReportUpload {
    /// Validates the scalar form fields.
    pub fn parameters(&self) -> Result<ReportParameters, ReportError> {
        let company_name = self
            .field("company_name")
            .ok_or_else(|| ReportError::InvalidRequest("company_name is required".to_string()))?
            .to_string();
        let start_date = parse_date("start_date", self.field("start_date"))?;
        let end_date = parse_date("end_date", self.field("end_date"))?;
        if start_date > end_date {
            return Err(ReportError::InvalidRequest(format!(
                "start_date {} is after end_date {}",
                start_date, end_date
            )));
        }
        let has_competitors = match self.field("has_competitors") {
            Some(raw) => parse_flag(raw).ok_or_else(|| {
                ReportError::InvalidRequest(format!("has_competitors: '{}' is not a boolean", raw))
            })?,
            None => false,
        };

        Ok(ReportParameters {
            company_name,
            start_date,
            end_date,
            has_competitors,
        })
    }

    /// Trimmed, non-empty value of a text field.
    fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// Parses every saved workbook. Blocking; call off the async runtime.
    pub fn load_sources(&self) -> Result<SourceSet, ReportError> {
        let workbooks = self
            .workbooks
            .iter()
            .map(|w| load_workbook(&w.source, &w.path))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(SourceSet::new(workbooks))
    }
}

fn parse_date(name: &str, raw: Option<&str>) -> Result<NaiveDate, ReportError> {
    let raw = raw.ok_or_else(|| ReportError::InvalidRequest(format!("{} is required", name)))?;
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ReportError::InvalidRequest(format!("{}: '{}' is not a YYYY-MM-DD date", name, raw))
    })
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "on" | "yes" => Some(true),
        "false" | "0" | "off" | "no" => Some(false),
        _ => None,
    }
}

/// Canonical name of a known workbook stem, matched case-insensitively.
fn known_source(stem: &str) -> Option<&'static str> {
    std::iter::once(COMBINED_SOURCES)
        .chain(ENGAGEMENT_SOURCES)
        .find(|known| known.eq_ignore_ascii_case(stem))
}

/// Running byte count over every part of a request.
struct Budget {
    used: usize,
    limit: usize,
}

impl Budget {
    fn take(&mut self, bytes: usize) -> Result<(), ReportError> {
        self.used += bytes;
        if self.used > self.limit {
            return Err(ReportError::Upload(format!(
                "upload exceeds the limit of {} bytes",
                self.limit
            )));
        }
        Ok(())
    }
}

async fn read_bytes(field: &mut Field, budget: &mut Budget) -> Result<Vec<u8>, ReportError> {
    let mut bytes = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        budget.take(chunk.len())?;
        bytes.extend_from_slice(&chunk);
    }
    Ok(bytes)
}

async fn save_to(field: &mut Field, path: &Path, budget: &mut Budget) -> Result<usize, ReportError> {
    let mut writer = BufWriter::new(File::create(path)?);
    let mut written = 0;
    while let Some(chunk) = field.next().await {
        let chunk = chunk?;
        budget.take(chunk.len())?;
        writer.write_all(&chunk)?;
        written += chunk.len();
    }
    writer.flush()?;
    Ok(written)
}

/// Reads the whole multipart form.
pub async fn read_upload(mut payload: Multipart, max_bytes: usize) -> Result<ReportUpload, ReportError> {
    let dir = tempfile::Builder::new().prefix("report-").tempdir()?;
    let mut budget = Budget {
        used: 0,
        limit: max_bytes,
    };
    let mut workbooks: Vec<UploadedWorkbook> = Vec::new();
    let mut assets = RenderAssets::default();
    let mut agency_logos: [Option<Vec<u8>>; 2] = [None, None];
    let mut posts: [BTreeMap<usize, PostSlot>; 2] = [BTreeMap::new(), BTreeMap::new()];
    let mut link_lists: [Vec<String>; 2] = [Vec::new(), Vec::new()];
    let mut fields: HashMap<String, String> = HashMap::new();

    while let Some(item) = payload.next().await {
        let mut field = item?;
        let name = field
            .content_disposition()
            .and_then(|cd| cd.get_name().map(|n| n.to_string()))
            .unwrap_or_default();

        match name.as_str() {
            WORKBOOK_FIELD => {
                let filename = field
                    .content_disposition()
                    .and_then(|cd| cd.get_filename().map(|f| f.to_string()))
                    .unwrap_or_default();
                let file_path = Path::new(&filename);
                let stem = file_path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();

                let Some(source) = known_source(stem) else {
                    warn!("Ignoring workbook '{}': unknown data source", filename);
                    read_bytes(&mut field, &mut budget).await?;
                    continue;
                };
                if workbooks.iter().any(|w| w.source == source) {
                    warn!("Duplicate upload for '{}', keeping the first one", source);
                    read_bytes(&mut field, &mut budget).await?;
                    continue;
                }

                let extension = file_path
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_ascii_lowercase();
                let path = dir.path().join(format!("{}.{}", Uuid::new_v4(), extension));
                let size = save_to(&mut field, &path, &mut budget).await?;
                debug!("Saved '{}' ({} bytes) as {}", filename, size, path.display());
                workbooks.push(UploadedWorkbook {
                    source: source.to_string(),
                    path,
                });
            }
            COMPANY_LOGO_FIELD => {
                let bytes = read_bytes(&mut field, &mut budget).await?;
                assets.company_logo = Some(bytes).filter(|b| !b.is_empty());
            }
            COMPETITOR_LOGOS_FIELD => {
                let bytes = read_bytes(&mut field, &mut budget).await?;
                if !bytes.is_empty() {
                    assets.competitor_logos.push(bytes);
                }
            }
            other if AGENCY_LOGO_FIELDS.contains(&other) => {
                let bytes = read_bytes(&mut field, &mut budget).await?;
                if let Some(slot) = AGENCY_LOGO_FIELDS.iter().position(|f| *f == other) {
                    agency_logos[slot] = Some(bytes).filter(|b| !b.is_empty());
                }
            }
            other if TEXT_FIELDS.contains(&other) => {
                let bytes = read_bytes(&mut field, &mut budget).await?;
                let value = String::from_utf8(bytes)
                    .map_err(|_| ReportError::Upload(format!("field '{}' is not valid UTF-8", other)))?;
                fields.insert(other.to_string(), value);
            }
            other if LINK_LIST_FIELDS.contains(&other) => {
                let bytes = read_bytes(&mut field, &mut budget).await?;
                if let Some(slot) = LINK_LIST_FIELDS.iter().position(|f| *f == other) {
                    link_lists[slot] = parse_link_list(other, &bytes);
                }
            }
            other => match POST_FIELD.captures(other) {
                Some(caps) => {
                    let polarity = if &caps[1] == "positive" { 0 } else { 1 };
                    let index: usize = caps[3]
                        .parse()
                        .map_err(|_| ReportError::Upload(format!("bad post index in '{}'", other)))?;
                    let bytes = read_bytes(&mut field, &mut budget).await?;
                    let slot = posts[polarity].entry(index).or_default();
                    if &caps[2] == "image" {
                        slot.image = Some(bytes).filter(|b| !b.is_empty());
                    } else {
                        let link = String::from_utf8_lossy(&bytes).trim().to_string();
                        slot.link = Some(link).filter(|l| !l.is_empty());
                    }
                }
                None => {
                    warn!("Ignoring unexpected form field '{}'", other);
                    read_bytes(&mut field, &mut budget).await?;
                }
            },
        }
    }

    assets.agency_logos = agency_logos.into_iter().flatten().collect();
    let [positive, negative] = posts;
    let [positive_links, negative_links] = link_lists;
    assets.positive_posts = collect_posts(positive, &positive_links);
    assets.negative_posts = collect_posts(negative, &negative_links);

    Ok(ReportUpload {
        _dir: dir,
        workbooks,
        assets,
        fields,
        total_bytes: budget.used,
    })
}

/// Links of a `*_links` field. Anything but a JSON array of strings is
/// logged and ignored.
fn parse_link_list(name: &str, bytes: &[u8]) -> Vec<String> {
    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Vec::new();
    }
    match serde_json::from_slice::<Vec<String>>(bytes) {
        Ok(links) => links
            .into_iter()
            .map(|l| l.trim().to_string())
            .filter(|l| !l.is_empty())
            .collect(),
        Err(e) => {
            warn!("Ignoring '{}': not a JSON list of links ({})", name, e);
            Vec::new()
        }
    }
}

/// Posts in index order. A link without an image has nothing to show. Posts
/// without their own link take the link list entry at their position.
fn collect_posts(slots: BTreeMap<usize, PostSlot>, fallback_links: &[String]) -> Vec<HighlightedPost> {
    slots
        .into_iter()
        .filter_map(|(index, slot)| match slot.image {
            Some(image) => Some((image, slot.link)),
            None => {
                if slot.link.is_some() {
                    warn!("Post {} has a link but no image, skipping", index);
                }
                None
            }
        })
        .enumerate()
        .map(|(position, (image, link))| HighlightedPost {
            image,
            link: link.or_else(|| fallback_links.get(position).cloned()),
        })
        .collect()
}
