//! Chromium page sessions over the DevTools protocol.
//!
//! A session either launches a headless browser of its own, or attaches to
//! one the user already runs (`--remote-debugging-port`). Probes and clicks
//! run as scripts in the page, the same way a content script would.

use async_trait::async_trait;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::{Stream, StreamExt};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::constants::constants;
use crate::expand::EXPAND_SELECTOR;
use crate::page::{PageError, PageSession};
use crate::youtube::PageIdentity;

const FOCUSED_SCRIPT: &str = "document.visibilityState === 'visible' && document.hasFocus()";

/// Which of the web tabs (by focus flag, in DevTools order) is the active one.
///
/// The first focused tab wins. With no focused tab, a lone web tab is taken as
/// active; several unfocused tabs are ambiguous.
fn pick_active(focused: &[bool]) -> Option<usize> {
  focused.iter().position(|&f| f).or(if focused.len() == 1 { Some(0) } else { None })
}

/// What the session is allowed to tear down when it is released.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Ownership {
  /// We launched the browser: close it.
  Browser,
  /// We opened a tab in the user's browser: close the tab only.
  Tab,
  /// The user's own tab: leave everything as it is.
  Borrowed,
}

struct Attached {
  browser: Browser,
  page: Page,
  handler: JoinHandle<()>,
  ownership: Ownership,
}

enum Target {
  /// Open `url` lazily, in a new headless browser or a tab of `remote`.
  Open { url: String, remote: Option<String> },
  /// Already attached, nothing to open.
  Ready,
}

pub struct BrowserSession {
  target: Target,
  attached: Option<Attached>,
}

impl BrowserSession {
  /// Session for a known address. Nothing starts until the page is first used,
  /// so a cache hit never launches a browser.
  pub fn for_link(identity: &PageIdentity, remote: Option<String>) -> Self {
    Self { target: Target::Open { url: identity.as_str().to_string(), remote }, attached: None }
  }

  /// Attach to the active tab of the browser at `remote` and report its address.
  pub async fn active_tab(remote: &str) -> Result<(Self, PageIdentity), PageError> {
    let (mut browser, handler) = connect(remote).await?;

    if let Err(e) = browser.fetch_targets().await {
      warn!(err = %e, "browser: fetching targets failed");
    }
    // Targets attach asynchronously after the fetch.
    tokio::time::sleep(Duration::from_millis(constants().attach_settle_ms)).await;

    let pages = match browser.pages().await {
      Ok(pages) => pages,
      Err(e) => {
        handler.abort();
        return Err(PageError::Browser(e.to_string()));
      }
    };

    let mut candidates = Vec::new();
    for page in pages {
      match page.url().await {
        Ok(Some(url)) if url.starts_with("http://") || url.starts_with("https://") => {
          let focused = eval_bool(&page, FOCUSED_SCRIPT).await.unwrap_or_else(|e| {
            debug!(url = %url, err = %e, "browser: focus check failed");
            false
          });
          candidates.push((page, url, focused));
        }
        Ok(url) => debug!(?url, "browser: skipping non-web tab"),
        Err(e) => debug!(err = %e, "browser: tab did not report its url"),
      }
    }

    let focus: Vec<bool> = candidates.iter().map(|(_, _, focused)| *focused).collect();
    let Some(index) = pick_active(&focus) else {
      handler.abort();
      let reason = if candidates.is_empty() { "No active tab detected." } else { "No focused tab detected." };
      return Err(PageError::NotReady(reason.to_string()));
    };
    let (page, url, _) = candidates.swap_remove(index);

    info!(url = %url, "browser: attached to active tab");
    let session = Self {
      target: Target::Ready,
      attached: Some(Attached { browser, page, handler, ownership: Ownership::Borrowed }),
    };
    Ok((session, PageIdentity::new(url)))
  }

  async fn page(&mut self) -> Result<&Page, PageError> {
    if self.attached.is_none() {
      let Target::Open { url, remote } = &self.target else {
        return Err(PageError::NotReady("browser session was already released".to_string()));
      };
      self.attached = Some(open(url, remote.as_deref()).await?);
      self.target = Target::Ready;
    }
    match &self.attached {
      Some(attached) => Ok(&attached.page),
      None => Err(PageError::NotReady("browser session was already released".to_string())),
    }
  }
}

async fn open(url: &str, remote: Option<&str>) -> Result<Attached, PageError> {
  let (browser, handler, ownership) = match remote {
    Some(remote) => {
      let (browser, handler) = connect(remote).await?;
      (browser, handler, Ownership::Tab)
    }
    None => {
      let (browser, handler) = launch().await?;
      (browser, handler, Ownership::Browser)
    }
  };

  info!(url = %url, ?ownership, "browser: opening page");
  let page = browser.new_page(url).await.map_err(|e| PageError::Browser(e.to_string()))?;
  page.wait_for_navigation().await.map_err(|e| PageError::NotReady(e.to_string()))?;
  Ok(Attached { browser, page, handler, ownership })
}

async fn launch() -> Result<(Browser, JoinHandle<()>), PageError> {
  let config = BrowserConfig::builder()
    .no_sandbox()
    .request_timeout(Duration::from_secs(constants().browser_request_timeout_secs))
    .arg("--disable-gpu")
    .arg("--disable-dev-shm-usage")
    .build()
    .map_err(PageError::Browser)?;

  let (browser, handler) = Browser::launch(config).await.map_err(|e| PageError::Browser(e.to_string()))?;
  Ok((browser, drive(handler)))
}

async fn connect(remote: &str) -> Result<(Browser, JoinHandle<()>), PageError> {
  info!(remote = %remote, "browser: connecting to running browser");
  let (browser, handler) = Browser::connect(remote)
    .await
    .map_err(|e| PageError::Browser(format!("Failed to connect to {}: {}", remote, e)))?;
  Ok((browser, drive(handler)))
}

/// Pump browser events until the connection ends.
fn drive<H, E>(mut handler: H) -> JoinHandle<()>
where
  H: Stream<Item = Result<(), E>> + Unpin + Send + 'static,
  E: Send + 'static,
{
  tokio::spawn(async move {
    while let Some(event) = handler.next().await {
      if event.is_err() {
        break;
      }
    }
  })
}

async fn eval_bool(page: &Page, script: &str) -> Result<bool, PageError> {
  page
    .evaluate(script)
    .await
    .map_err(|e| PageError::Script(e.to_string()))?
    .into_value::<bool>()
    .map_err(|e| PageError::Script(e.to_string()))
}

#[async_trait]
impl PageSession for BrowserSession {
  async fn has_expand_control(&mut self) -> Result<bool, PageError> {
    let script = format!("document.querySelector('{}') !== null", EXPAND_SELECTOR);
    eval_bool(self.page().await?, &script).await
  }

  async fn click_expand_control(&mut self) -> Result<(), PageError> {
    let script = format!(
      "(() => {{ const btn = document.querySelector('{}'); if (!btn) return false; btn.click(); return true; }})()",
      EXPAND_SELECTOR
    );
    if eval_bool(self.page().await?, &script).await? {
      Ok(())
    } else {
      Err(PageError::Script("expand control disappeared before it could be clicked".to_string()))
    }
  }

  async fn content(&mut self) -> Result<String, PageError> {
    self.page().await?.content().await.map_err(|e| PageError::NotReady(e.to_string()))
  }

  async fn release(&mut self) {
    let Some(Attached { mut browser, page, handler, ownership }) = self.attached.take() else { return };
    match ownership {
      Ownership::Browser => {
        if let Err(e) = browser.close().await {
          warn!(err = %e, "browser: close failed");
        }
        let _ = browser.wait().await;
      }
      Ownership::Tab => {
        if let Err(e) = page.close().await {
          warn!(err = %e, "browser: closing tab failed");
        }
      }
      Ownership::Borrowed => {}
    }
    handler.abort();
    debug!(?ownership, "browser: session released");
  }
}
