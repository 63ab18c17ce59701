//! PDF Viewer state machine
//!
//! Owns the view state (current page, zoom) of one loaded document and decides when the
//! drawing surface must be re-rendered. Rendering itself happens elsewhere (pdf.js in the
//! browser); callers execute the [`RenderRequest`]s handed out here and report back through
//! [`PdfViewer::finish_render`].
//!
//! States: `Empty` -> `Loading` -> `Ready`, with a render in flight as a sub-state of `Ready`.
//! At most one render is in flight. Navigation while busy is parked in a single pending slot
//! that always holds the latest requested view, so the last request is never lost.

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Tolerance used when comparing zoom scales built from repeated additions
const SCALE_EPSILON: f64 = 1e-9;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum ViewerError {
    #[error("Error loading PDF: {0}")]
    Load(String),

    #[error("PDF has no pages")]
    EmptyDocument,

    #[error("Error rendering page {page}: {message}")]
    Render { page: u32, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ViewerPhase {
    Empty,
    Loading,
    Ready,
}

/// Zoom limits and starting scale
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ZoomSettings {
    pub initial_scale: f64,
    pub step: f64,
    pub min_scale: f64,
}

impl Default for ZoomSettings {
    fn default() -> Self {
        Self {
            initial_scale: 1.5,
            step: 0.25,
            min_scale: 0.5,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewState {
    pub current_page: u32,
    pub scale: f64,
}

/// Handle for one document load, returned by [`PdfViewer::begin_load`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
}

impl LoadTicket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// One page render the caller must perform
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub id: u64,
    /// Document generation the request belongs to
    pub generation: u64,
    /// 1-indexed page
    pub page: u32,
    pub scale: f64,
}

impl RenderRequest {
    fn view(&self) -> ViewState {
        ViewState {
            current_page: self.page,
            scale: self.scale,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum LoadResult {
    /// Document is ready; render the first page if a request is given
    Ready {
        total_pages: u32,
        render: Option<RenderRequest>,
    },
    Failed(ViewerError),
    /// A newer load superseded this one
    Stale,
}

/// What to do after a render completes
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RenderFinish {
    /// Follow-up render for the latest pending view
    pub next: Option<RenderRequest>,
    pub error: Option<ViewerError>,
}

#[derive(Debug)]
pub struct PdfViewer {
    zoom: ZoomSettings,
    phase: ViewerPhase,
    generation: u64,
    total_pages: u32,
    view: ViewState,
    next_render_id: u64,
    in_flight: Option<RenderRequest>,
    pending: Option<ViewState>,
    last_rendered: Option<(u64, ViewState)>,
}

impl PdfViewer {
    pub fn new(zoom: ZoomSettings) -> Self {
        Self {
            zoom,
            phase: ViewerPhase::Empty,
            generation: 0,
            total_pages: 0,
            view: ViewState {
                current_page: 1,
                scale: zoom.initial_scale,
            },
            next_render_id: 0,
            in_flight: None,
            pending: None,
            last_rendered: None,
        }
    }

    /// Invalidate the current document and start loading a new one
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.phase = ViewerPhase::Loading;
        self.total_pages = 0;
        self.pending = None;
        self.last_rendered = None;
        debug!(generation = self.generation, "document load started");
        LoadTicket {
            generation: self.generation,
        }
    }

    /// Record the outcome of the load identified by `ticket`
    pub fn finish_load(
        &mut self,
        ticket: LoadTicket,
        result: Result<u32, String>,
    ) -> LoadResult {
        if ticket.generation != self.generation {
            warn!(
                stale = ticket.generation,
                current = self.generation,
                "discarding superseded document load"
            );
            return LoadResult::Stale;
        }

        match result {
            Ok(0) => {
                self.phase = ViewerPhase::Empty;
                LoadResult::Failed(ViewerError::EmptyDocument)
            }
            Ok(total_pages) => {
                info!(total_pages, "document loaded");
                self.phase = ViewerPhase::Ready;
                self.total_pages = total_pages;
                self.view.current_page = 1;
                LoadResult::Ready {
                    total_pages,
                    render: self.request_render(),
                }
            }
            Err(message) => {
                warn!(%message, "document load failed");
                self.phase = ViewerPhase::Empty;
                LoadResult::Failed(ViewerError::Load(message))
            }
        }
    }

    /// Drop the document and return to `Empty`
    pub fn unload(&mut self) {
        self.generation += 1;
        self.phase = ViewerPhase::Empty;
        self.total_pages = 0;
        self.pending = None;
        self.last_rendered = None;
    }

    /// Move to page `page`; no-op outside `1..=total_pages` or when already there
    pub fn go_to_page(&mut self, page: u32) -> Option<RenderRequest> {
        if self.phase != ViewerPhase::Ready {
            return None;
        }
        if page < 1 || page > self.total_pages {
            debug!(page, total_pages = self.total_pages, "ignoring out-of-range page");
            return None;
        }
        if page == self.view.current_page {
            return None;
        }

        self.view.current_page = page;
        self.request_render()
    }

    pub fn next_page(&mut self) -> Option<RenderRequest> {
        self.go_to_page(self.view.current_page.saturating_add(1))
    }

    pub fn prev_page(&mut self) -> Option<RenderRequest> {
        self.go_to_page(self.view.current_page.saturating_sub(1))
    }

    /// Jump to the source page of a field; page 0 means "unknown" and does nothing
    pub fn jump_to_field(&mut self, page: u32) -> Option<RenderRequest> {
        if page == 0 {
            return None;
        }
        self.go_to_page(page)
    }

    /// Zoom in by one step; no-op until a document is ready
    pub fn zoom_in(&mut self) -> Option<RenderRequest> {
        if self.phase != ViewerPhase::Ready {
            return None;
        }
        self.view.scale += self.zoom.step;
        self.request_render()
    }

    /// Zoom out by one step, clamped to the minimum scale
    pub fn zoom_out(&mut self) -> Option<RenderRequest> {
        if self.phase != ViewerPhase::Ready || !self.can_zoom_out() {
            return None;
        }
        self.view.scale = (self.view.scale - self.zoom.step).max(self.zoom.min_scale);
        self.request_render()
    }

    /// Start a render of the current view, or park it if one is already in flight
    fn request_render(&mut self) -> Option<RenderRequest> {
        if self.phase != ViewerPhase::Ready {
            return None;
        }

        if let Some(busy) = self.in_flight {
            debug!(busy = busy.id, page = self.view.current_page, "render busy, parking request");
            self.pending = Some(self.view);
            return None;
        }

        self.pending = None;
        self.next_render_id += 1;
        let request = RenderRequest {
            id: self.next_render_id,
            generation: self.generation,
            page: self.view.current_page,
            scale: self.view.scale,
        };
        debug!(id = request.id, page = request.page, scale = request.scale, "render started");
        self.in_flight = Some(request);
        Some(request)
    }

    /// Report the end of `request`; returns the follow-up render, if any
    pub fn finish_render(
        &mut self,
        request: &RenderRequest,
        result: Result<(), String>,
    ) -> RenderFinish {
        match self.in_flight {
            Some(current) if current.id == request.id => self.in_flight = None,
            _ => {
                warn!(id = request.id, "finish for a render that is not in flight");
                return RenderFinish::default();
            }
        }

        let current_document = request.generation == self.generation;
        let mut finish = RenderFinish::default();

        match result {
            Ok(()) if current_document => {
                self.last_rendered = Some((request.generation, request.view()));
            }
            Ok(()) => {}
            Err(message) => {
                warn!(page = request.page, %message, "render failed");
                finish.error = Some(ViewerError::Render {
                    page: request.page,
                    message,
                });
                self.last_rendered = None;

                if current_document && self.phase == ViewerPhase::Ready && request.page != 1 {
                    info!(page = request.page, "render failed, returning to page 1");
                    self.view.current_page = 1;
                    self.pending = Some(self.view);
                }
            }
        }

        if let Some(view) = self.pending.take() {
            let already_drawn = self.last_rendered == Some((self.generation, view));
            if !already_drawn {
                finish.next = self.request_render();
            }
        }

        finish
    }

    pub fn phase(&self) -> ViewerPhase {
        self.phase
    }

    pub fn is_rendering(&self) -> bool {
        self.in_flight.is_some()
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn view(&self) -> ViewState {
        self.view
    }

    pub fn current_page(&self) -> u32 {
        self.view.current_page
    }

    pub fn scale(&self) -> f64 {
        self.view.scale
    }

    pub fn total_pages(&self) -> u32 {
        self.total_pages
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn can_prev(&self) -> bool {
        self.phase == ViewerPhase::Ready && self.view.current_page > 1
    }

    pub fn can_next(&self) -> bool {
        self.phase == ViewerPhase::Ready && self.view.current_page < self.total_pages
    }

    pub fn can_zoom_out(&self) -> bool {
        self.view.scale > self.zoom.min_scale + SCALE_EPSILON
    }

    /// "Page N of M" for the toolbar
    pub fn page_label(&self) -> String {
        format!("Page {} of {}", self.view.current_page, self.total_pages)
    }
}

impl Default for PdfViewer {
    fn default() -> Self {
        Self::new(ZoomSettings::default())
    }
}
