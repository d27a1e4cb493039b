use crate::source::Reading;

pub const LABEL: &str = "fps: ";
pub const MAX_READING_CHARS: usize = 9;
/// Widest label expected in practice; sizes the box before the first reading arrives.
pub const WORST_CASE_SAMPLE: &str = "fps: 60.1";

const PADDING_DP: f32 = 9.0;
const TEXT_SIZE_DP: f32 = 15.0;

/// Label text derived from the latest present reading.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayText(String);

impl DisplayText {
    pub fn from_reading(raw: &str) -> Self {
        let mut text = String::with_capacity(LABEL.len() + MAX_READING_CHARS);
        text.push_str(LABEL);
        text.extend(raw.chars().take(MAX_READING_CHARS));
        Self(text)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Text measurement supplied by the host toolkit.
pub trait TextMetrics {
    fn measure(&self, text: &str) -> u32;
    fn ascent(&self) -> u32;
    fn descent(&self) -> u32;
}

/// Every glyph has the same advance. Good enough for terminals and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonospaceMetrics {
    pub glyph_width: u32,
    pub ascent: u32,
    pub descent: u32,
}

impl MonospaceMetrics {
    /// Metrics for a font of `text_size` pixels.
    pub fn for_text_size(text_size: u32) -> Self {
        let ascent = text_size.saturating_mul(4).div_ceil(5);
        Self {
            glyph_width: text_size.div_ceil(2).max(1),
            ascent,
            descent: text_size.saturating_sub(ascent).max(1),
        }
    }
}

impl TextMetrics for MonospaceMetrics {
    fn measure(&self, text: &str) -> u32 {
        (text.chars().count() as u32).saturating_mul(self.glyph_width)
    }

    fn ascent(&self) -> u32 {
        self.ascent
    }

    fn descent(&self) -> u32 {
        self.descent
    }
}

/// Layout constants computed once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LayoutSpec {
    pub padding: u32,
    pub max_text_width: u32,
    pub line_height: u32,
    pub ascent: u32,
}

impl LayoutSpec {
    pub fn new(density: f32, metrics: &dyn TextMetrics) -> Self {
        Self {
            padding: (PADDING_DP * density).round().max(0.0) as u32,
            max_text_width: metrics.measure(WORST_CASE_SAMPLE),
            line_height: metrics.ascent().saturating_add(metrics.descent()),
            ascent: metrics.ascent(),
        }
    }

    pub fn text_size(density: f32) -> u32 {
        (TEXT_SIZE_DP * density).round().max(1.0) as u32
    }

    fn needed_size(&self) -> (u32, u32) {
        let frame = self.padding.saturating_mul(2);
        (
            frame.saturating_add(self.max_text_width),
            frame.saturating_add(self.line_height),
        )
    }
}

/// What the host should do after a reading was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderRequest {
    None,
    Repaint,
    Layout,
}

/// Consumer-owned state; only [`RenderState::apply`] mutates it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RenderState {
    current_text: DisplayText,
    text_width: u32,
    measured_width: u32,
    measured_height: u32,
    dirty_size: bool,
    data_available: bool,
}

impl RenderState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn apply(
        &mut self,
        reading: &Reading,
        layout: &mut LayoutSpec,
        metrics: &dyn TextMetrics,
    ) -> RenderRequest {
        let Some(raw) = reading.as_text() else {
            return RenderRequest::None;
        };
        let text = DisplayText::from_reading(raw);
        let text_width = metrics.measure(text.as_str());
        layout.max_text_width = layout.max_text_width.max(text_width);
        self.current_text = text;
        self.text_width = text_width;
        self.data_available = true;

        let (width, height) = layout.needed_size();
        if width != self.measured_width || height != self.measured_height {
            self.measured_width = width;
            self.measured_height = height;
            self.dirty_size = true;
            RenderRequest::Layout
        } else {
            self.dirty_size = false;
            RenderRequest::Repaint
        }
    }

    pub fn current_text(&self) -> &str {
        self.current_text.as_str()
    }

    pub fn measured_size(&self) -> (u32, u32) {
        (self.measured_width, self.measured_height)
    }

    pub fn dirty_size(&self) -> bool {
        self.dirty_size
    }

    pub fn has_data(&self) -> bool {
        self.data_available
    }
}

/// Painting surface supplied by the host toolkit.
pub trait Canvas {
    fn draw_text(&mut self, x: u32, baseline: u32, text: &str);
}

/// Paint the current text right-aligned inside `bounds_width`. Draws nothing before the first reading.
pub fn draw(state: &RenderState, bounds_width: u32, layout: &LayoutSpec, canvas: &mut dyn Canvas) {
    if !state.data_available {
        return;
    }
    let right = bounds_width.saturating_sub(layout.padding);
    let x = right.saturating_sub(state.text_width);
    canvas.draw_text(
        x,
        layout.padding.saturating_add(layout.ascent),
        state.current_text(),
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> MonospaceMetrics {
        MonospaceMetrics {
            glyph_width: 10,
            ascent: 12,
            descent: 4,
        }
    }

    fn layout() -> LayoutSpec {
        LayoutSpec::new(1.0, &metrics())
    }

    #[derive(Default)]
    struct RecordingCanvas {
        calls: Vec<(u32, u32, String)>,
    }

    impl Canvas for RecordingCanvas {
        fn draw_text(&mut self, x: u32, baseline: u32, text: &str) {
            self.calls.push((x, baseline, text.to_string()));
        }
    }

    #[test]
    fn truncates_to_nine_chars() {
        let cases = [
            ("", "fps: "),
            ("59.87", "fps: 59.87"),
            ("123456789", "fps: 123456789"),
            ("12345678901234567890", "fps: 123456789"),
        ];
        for (raw, expected) in cases {
            assert_eq!(DisplayText::from_reading(raw).as_str(), expected, "raw={raw:?}");
        }
    }

    #[test]
    fn truncation_counts_chars_not_bytes() {
        let text = DisplayText::from_reading("ééééééééééé");
        assert_eq!(text.as_str(), format!("{LABEL}{}", "é".repeat(9)));
    }

    #[test]
    fn absent_reading_changes_nothing() {
        let mut state = RenderState::new();
        let mut layout = layout();
        let before = state.clone();
        assert_eq!(
            state.apply(&Reading::Absent, &mut layout, &metrics()),
            RenderRequest::None
        );
        assert_eq!(state, before);

        state.apply(&Reading::Present("59.87".into()), &mut layout, &metrics());
        let before = state.clone();
        let layout_before = layout;
        assert_eq!(
            state.apply(&Reading::Absent, &mut layout, &metrics()),
            RenderRequest::None
        );
        assert_eq!(state, before);
        assert_eq!(layout, layout_before);
    }

    #[test]
    fn first_reading_requests_layout_then_repaints() {
        let mut state = RenderState::new();
        let mut layout = layout();
        let first = state.apply(&Reading::Present("59.87".into()), &mut layout, &metrics());
        assert_eq!(first, RenderRequest::Layout);
        assert!(state.dirty_size());
        assert_eq!(state.current_text(), "fps: 59.87");
        // worst case "fps: 60.1" is 9 glyphs, "fps: 59.87" is 10 and grows the box once
        assert_eq!(state.measured_size(), (9 * 2 + 100, 9 * 2 + 16));

        let second = state.apply(&Reading::Present("60.00".into()), &mut layout, &metrics());
        assert_eq!(second, RenderRequest::Repaint);
        assert!(!state.dirty_size());
        assert_eq!(state.current_text(), "fps: 60.00");
    }

    #[test]
    fn box_grows_but_never_shrinks() {
        let mut state = RenderState::new();
        let mut layout = layout();
        state.apply(&Reading::Present("60".into()), &mut layout, &metrics());
        let (narrow, _) = state.measured_size();
        assert_eq!(narrow, 18 + 90);

        let grow = state.apply(&Reading::Present("119.99999".into()), &mut layout, &metrics());
        assert_eq!(grow, RenderRequest::Layout);
        let (wide, _) = state.measured_size();
        assert_eq!(wide, 18 + 140);

        let shorter = state.apply(&Reading::Present("60".into()), &mut layout, &metrics());
        assert_eq!(shorter, RenderRequest::Repaint);
        assert_eq!(state.measured_size().0, wide);
    }

    #[test]
    fn passes_through_every_reading_in_order() {
        let mut state = RenderState::new();
        let mut layout = layout();
        let inputs = ["59.8", "60.0", "90.1", "120.0", "60.0"];
        let mut seen = Vec::new();
        for raw in inputs {
            state.apply(&Reading::Present(raw.into()), &mut layout, &metrics());
            seen.push(state.current_text().to_string());
        }
        let expected: Vec<String> = inputs.iter().map(|s| format!("fps: {s}")).collect();
        assert_eq!(seen, expected);
    }

    #[test]
    fn draw_is_empty_before_data() {
        let state = RenderState::new();
        let mut canvas = RecordingCanvas::default();
        draw(&state, 200, &layout(), &mut canvas);
        assert!(canvas.calls.is_empty());
    }

    #[test]
    fn draw_right_aligns_text() {
        let mut state = RenderState::new();
        let mut layout = layout();
        state.apply(&Reading::Present("60".into()), &mut layout, &metrics());
        let mut canvas = RecordingCanvas::default();
        draw(&state, 200, &layout, &mut canvas);
        // "fps: 60" = 7 glyphs = 70px, right edge at 200 - 9
        assert_eq!(canvas.calls, vec![(121, 9 + 12, "fps: 60".to_string())]);
    }

    #[test]
    fn oversized_metrics_saturate() {
        let metrics = MonospaceMetrics::for_text_size(u32::MAX);
        let mut layout = LayoutSpec::new(1e9, &metrics);
        assert_eq!(layout.padding, u32::MAX);
        let mut state = RenderState::new();
        let request = state.apply(&Reading::Present("60".into()), &mut layout, &metrics);
        assert_eq!(request, RenderRequest::Layout);
        assert_eq!(state.measured_size(), (u32::MAX, u32::MAX));
    }

    #[test]
    fn layout_scales_with_density() {
        let size = LayoutSpec::text_size(2.0);
        assert_eq!(size, 30);
        let spec = LayoutSpec::new(2.0, &MonospaceMetrics::for_text_size(size));
        assert_eq!(spec.padding, 18);
        assert_eq!(spec.max_text_width, 9 * 15);
        assert_eq!(spec.line_height, 30);
    }
}
