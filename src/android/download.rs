//! Fetching the app package from a mirror site and the editor jar from
//! GitHub releases.
//!
//! Every request is made once; any failure aborts the download.

use crate::config::AndroidSettings;
use crate::error::{PatchError, Result};
use indicatif::{ProgressBar, ProgressStyle};
use regex::Regex;
use reqwest::blocking::{Client, Response};
use scraper::{Html, Selector};
use serde::Deserialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use std::time::Duration;

const PAGE_TIMEOUT: Duration = Duration::from_secs(10);
const LINK_TIMEOUT: Duration = Duration::from_secs(15);

// Downloads are only bounded while connecting; the body may take as long as it needs.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(20);

/// Final download host; a redirect landing here is already the file.
const STORAGE_HOST: &str = "r2.cloudflarestorage.com";

static TITLE_SELECTOR: LazyLock<Selector> = LazyLock::new(|| {
	Selector::parse("#primary > div.listWidget.p-relative .appRow h5.appRowTitle")
		.expect("title selector")
});
static BUTTON_SELECTOR: LazyLock<Selector> =
	LazyLock::new(|| Selector::parse("a.downloadButton[href]").expect("button selector"));
static LINK_SELECTOR: LazyLock<Selector> =
	LazyLock::new(|| Selector::parse("a#download-link[href]").expect("link selector"));
static VERSION_RE: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r"v?(\d+\.\d+\.\d+)").expect("version regex"));

/// First non-empty `href` among elements matching `selector`.
fn first_href(html: &str, selector: &Selector) -> Option<String> {
	Html::parse_document(html)
		.select(selector)
		.filter_map(|el| el.value().attr("href"))
		.find(|href| !href.is_empty())
		.map(str::to_string)
}

/// Version number from the first app row title on a listing page.
pub fn extract_version(html: &str) -> Option<String> {
	let document = Html::parse_document(html);
	let title: String = document.select(&TITLE_SELECTOR).next()?.text().collect();
	let version = VERSION_RE.captures(title.trim())?;
	Some(version[1].to_string())
}

/// `href` of the first `<a class="downloadButton">` with a non-empty link.
pub fn find_download_button(html: &str) -> Option<String> {
	first_href(html, &BUTTON_SELECTOR)
}

/// `href` of the `<a id="download-link">` on the final download page.
pub fn find_download_link(html: &str) -> Option<String> {
	first_href(html, &LINK_SELECTOR)
}

/// `1.2.3` becomes `<prefix>-1-2-3`.
pub fn version_slug(prefix: &str, version: &str) -> String {
	format!("{}-{}", prefix, version.replace('.', "-"))
}

/// Release page for one version on the mirror.
pub fn release_page_url(mirror_url: &str, slug: &str) -> String {
	format!(
		"{}/{slug}-release/{slug}-android-apk-download/",
		mirror_url.trim_end_matches('/')
	)
}

#[derive(Debug, Deserialize)]
struct Release {
	#[serde(default)]
	assets: Vec<ReleaseAsset>,
}

#[derive(Debug, Deserialize)]
struct ReleaseAsset {
	browser_download_url: Option<String>,
}

/// HTTP access for one run. Headers are fixed when the client is built.
#[derive(Debug, Clone)]
pub struct Downloader {
	client: Client,
	mirror_url: String,
	mirror_origin: String,
	version_slug_prefix: String,
	editor_repo: String,
	github_api: String,
	page_timeout: Duration,
	link_timeout: Duration,
}

impl Downloader {
	pub fn new(settings: &AndroidSettings) -> Result<Self> {
		let client = Client::builder()
			.user_agent(settings.user_agent.clone())
			.connect_timeout(CONNECT_TIMEOUT)
			.timeout(None::<Duration>)
			.build()
			.map_err(|source| PatchError::HttpClient { source })?;

		Ok(Downloader {
			client,
			mirror_url: settings.mirror_url.clone(),
			mirror_origin: settings.mirror_origin.trim_end_matches('/').to_string(),
			version_slug_prefix: settings.version_slug_prefix.clone(),
			editor_repo: settings.editor_repo.clone(),
			github_api: settings.github_api.trim_end_matches('/').to_string(),
			page_timeout: PAGE_TIMEOUT,
			link_timeout: LINK_TIMEOUT,
		})
	}

	/// Override the limits for page and link requests. File downloads stay unbounded.
	pub fn with_timeouts(mut self, page: Duration, link: Duration) -> Self {
		self.page_timeout = page;
		self.link_timeout = link;
		self
	}

	fn get(&self, url: &str, timeout: Option<Duration>) -> Result<Response> {
		tracing::debug!("GET {}", url);
		let to_error = |source| PatchError::HttpError {
			url: url.to_string(),
			source,
		};
		let mut request = self.client.get(url);
		if let Some(timeout) = timeout {
			request = request.timeout(timeout);
		}
		request
			.send()
			.and_then(Response::error_for_status)
			.map_err(to_error)
	}

	fn fetch_text(&self, url: &str, timeout: Duration) -> Result<String> {
		self.get(url, Some(timeout))?
			.text()
			.map_err(|source| PatchError::HttpError {
				url: url.to_string(),
				source,
			})
	}

	/// Latest version number listed on the mirror.
	pub fn latest_version(&self) -> Result<String> {
		let html = self.fetch_text(&self.mirror_url, self.page_timeout)?;
		extract_version(&html).ok_or_else(|| PatchError::UnexpectedResponse {
			url: self.mirror_url.clone(),
			reason: "no version found in app title; page structure may have changed".to_string(),
		})
	}

	/// Resolve the mirror's intermediate download page for `version`.
	pub fn download_page_url(&self, version: &str) -> Result<String> {
		let slug = version_slug(&self.version_slug_prefix, version);
		let page_url = release_page_url(&self.mirror_url, &slug);
		let html = self.fetch_text(&page_url, self.page_timeout)?;

		let href = find_download_button(&html).ok_or_else(|| PatchError::UnexpectedResponse {
			url: page_url.clone(),
			reason: "download button not found; page structure may have changed".to_string(),
		})?;
		Ok(format!("{}{}", self.mirror_origin, href.trim_end_matches('/')))
	}

	/// Follow the download page to a direct file URL.
	pub fn final_download_url(&self, page_url: &str) -> Result<String> {
		let response = self.get(page_url, Some(self.link_timeout))?;
		let landed = response.url().to_string();
		if landed.contains(STORAGE_HOST) {
			return Ok(landed);
		}

		let html = response.text().map_err(|source| PatchError::HttpError {
			url: page_url.to_string(),
			source,
		})?;
		let href = find_download_link(&html).ok_or_else(|| PatchError::UnexpectedResponse {
			url: page_url.to_string(),
			reason: "download link not found; page structure may have changed".to_string(),
		})?;
		Ok(format!("{}{}", self.mirror_origin, href))
	}

	/// Find and download the latest package from the mirror.
	pub fn download_app_package(&self, dest: &Path) -> Result<u64> {
		tracing::info!("Fetching latest version from {}", self.mirror_url);
		let version = self.latest_version()?;
		tracing::info!("Detected latest version: {}", version);

		let page_url = self.download_page_url(&version)?;
		let direct_url = self.final_download_url(&page_url)?;
		tracing::info!("Final download link obtained: {}", direct_url);

		self.download_file(&direct_url, dest)
	}

	/// Asset URL of the editor's latest GitHub release.
	pub fn latest_editor_asset_url(&self) -> Result<String> {
		let api_url = format!("{}/repos/{}/releases/latest", self.github_api, self.editor_repo);
		let body = self.fetch_text(&api_url, self.page_timeout)?;
		let release: Release =
			serde_json::from_str(&body).map_err(|source| PatchError::JsonError {
				url: api_url.clone(),
				source,
			})?;

		let asset = release
			.assets
			.into_iter()
			.next()
			.ok_or_else(|| PatchError::UnexpectedResponse {
				url: api_url.clone(),
				reason: "latest release has no assets".to_string(),
			})?;
		asset
			.browser_download_url
			.ok_or_else(|| PatchError::UnexpectedResponse {
				url: api_url,
				reason: "release asset has no download link".to_string(),
			})
	}

	/// Download the editor jar from its latest release.
	pub fn download_editor_jar(&self, dest: &Path) -> Result<u64> {
		let url = self.latest_editor_asset_url()?;
		tracing::info!("Starting download of {}: {}", display_name(dest), url);
		self.download_file(&url, dest)
	}

	/// Stream `url` to `dest` with a progress bar.
	///
	/// Data lands in `<dest>.part` first so a failed download never leaves a
	/// truncated file under the real name.
	pub fn download_file(&self, url: &str, dest: &Path) -> Result<u64> {
		let response = self.get(url, None)?;
		let total = response.content_length();

		let partial = partial_path(dest);
		let result = write_with_progress(response, &partial, total, &display_name(dest))
			.and_then(|written| {
				std::fs::rename(&partial, dest).map_err(|source| PatchError::WriteError {
					path: dest.to_path_buf(),
					source,
				})?;
				Ok(written)
			});

		match result {
			Ok(written) => {
				match total {
					Some(total) => tracing::info!(
						"File download completed: {} ({}/{} bytes)",
						dest.display(),
						written,
						total
					),
					None => tracing::info!(
						"File download completed: {} (unknown size)",
						dest.display()
					),
				}
				Ok(written)
			}
			Err(e) => {
				let _ = std::fs::remove_file(&partial);
				Err(e)
			}
		}
	}
}

fn display_name(path: &Path) -> String {
	path.file_name()
		.map(|name| name.to_string_lossy().into_owned())
		.unwrap_or_else(|| path.display().to_string())
}

fn partial_path(dest: &Path) -> PathBuf {
	let mut name = dest.as_os_str().to_os_string();
	name.push(".part");
	PathBuf::from(name)
}

fn write_with_progress(
	response: Response,
	path: &Path,
	total: Option<u64>,
	label: &str,
) -> Result<u64> {
	let bar = match total {
		Some(len) => ProgressBar::new(len),
		None => ProgressBar::new_spinner(),
	};
	let style = ProgressStyle::with_template(
		"{msg} [{bar:40.cyan/blue}] {bytes}/{total_bytes} ({bytes_per_sec}, {eta})",
	)
	.unwrap_or_else(|_| ProgressStyle::default_bar())
	.progress_chars("=>-");
	bar.set_style(style);
	bar.set_message(label.to_string());

	let mut file = File::create(path).map_err(|source| PatchError::WriteError {
		path: path.to_path_buf(),
		source,
	})?;
	let written = std::io::copy(&mut bar.wrap_read(response), &mut file).map_err(|source| {
		PatchError::WriteError {
			path: path.to_path_buf(),
			source,
		}
	})?;
	bar.finish();
	Ok(written)
}
