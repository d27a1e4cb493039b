use std::io::Write;

use crate::render::{self, Canvas, LayoutSpec, RenderState};

/// Window host that places the label on screen. Placement, focus and input are its business.
pub trait OverlayHost {
    fn attach(&mut self);
    fn detach(&mut self);
    fn set_visible(&mut self, visible: bool);
    /// Size changed; re-measure against `state.measured_size()` and redraw.
    fn request_layout(&mut self, state: &RenderState, layout: &LayoutSpec);
    /// Same size; redraw only.
    fn invalidate(&mut self, state: &RenderState, layout: &LayoutSpec);
}

/// The overlay and its window flags, owned by the lifecycle controller.
pub struct Overlay<H: OverlayHost> {
    host: H,
    attached: bool,
    visible: bool,
}

impl<H: OverlayHost> Overlay<H> {
    pub fn new(host: H) -> Self {
        Self {
            host,
            attached: false,
            visible: false,
        }
    }

    pub fn attach(&mut self) {
        if !self.attached {
            self.host.attach();
            self.attached = true;
            // A freshly attached window starts visible.
            self.visible = true;
        }
    }

    pub fn detach(&mut self) {
        if self.attached {
            self.host.detach();
            self.attached = false;
            self.visible = false;
        }
    }

    pub fn set_visible(&mut self, visible: bool) {
        if self.attached && self.visible != visible {
            self.host.set_visible(visible);
            self.visible = visible;
        }
    }

    pub fn request_layout(&mut self, state: &RenderState, layout: &LayoutSpec) {
        if self.attached && self.visible {
            self.host.request_layout(state, layout);
        }
    }

    pub fn invalidate(&mut self, state: &RenderState, layout: &LayoutSpec) {
        if self.attached && self.visible {
            self.host.invalidate(state, layout);
        }
    }

    pub fn is_attached(&self) -> bool {
        self.attached
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn host(&self) -> &H {
        &self.host
    }
}

/// Row of character cells; pixel x positions are mapped onto columns.
struct CharCanvas {
    glyph_width: u32,
    cells: Vec<char>,
}

impl Canvas for CharCanvas {
    fn draw_text(&mut self, x: u32, _baseline: u32, text: &str) {
        let start = (x / self.glyph_width.max(1)) as usize;
        for (offset, ch) in text.chars().enumerate() {
            if let Some(cell) = self.cells.get_mut(start + offset) {
                *cell = ch;
            }
        }
    }
}

/// Headless host that prints each frame as one line of text.
pub struct TerminalOverlay<W: Write> {
    out: W,
    glyph_width: u32,
    bounds_width: u32,
    visible: bool,
    frames: usize,
}

impl<W: Write> TerminalOverlay<W> {
    pub fn new(out: W, glyph_width: u32) -> Self {
        Self {
            out,
            glyph_width: glyph_width.max(1),
            bounds_width: 0,
            visible: false,
            frames: 0,
        }
    }

    pub fn frames(&self) -> usize {
        self.frames
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    fn paint(&mut self, state: &RenderState, layout: &LayoutSpec) {
        if !self.visible || !state.has_data() {
            return;
        }
        let mut canvas = CharCanvas {
            glyph_width: self.glyph_width,
            cells: vec![' '; (self.bounds_width / self.glyph_width) as usize],
        };
        render::draw(state, self.bounds_width, layout, &mut canvas);
        let row: String = canvas.cells.into_iter().collect();
        if let Err(err) = writeln!(self.out, "{row}").and_then(|_| self.out.flush()) {
            log::warn!("overlay write failed: {err}");
            return;
        }
        self.frames += 1;
    }
}

impl<W: Write> OverlayHost for TerminalOverlay<W> {
    fn attach(&mut self) {
        self.visible = true;
        log::debug!("overlay attached");
    }

    fn detach(&mut self) {
        self.visible = false;
        log::debug!("overlay detached");
    }

    fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    fn request_layout(&mut self, state: &RenderState, layout: &LayoutSpec) {
        self.bounds_width = state.measured_size().0;
        self.paint(state, layout);
    }

    fn invalidate(&mut self, state: &RenderState, layout: &LayoutSpec) {
        self.paint(state, layout);
    }
}
