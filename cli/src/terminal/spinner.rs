use indicatif::ProgressStyle;
use tracing::{Span, info_span};
use tracing_indicatif::span_ext::IndicatifSpanExt;

const TICKS: &[&str] = &[
    "▁▁▁▁▁",
    "▁▂▂▂▁",
    "▁▄▂▄▁",
    "▂▄▆▄▂",
    "▄▆█▆▄",
    "▂▄▆▄▂",
    "▁▄▂▄▁",
    "▁▂▂▂▁",
];

pub fn style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.blue} {msg} {elapsed:.dim}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_strings(TICKS)
}

/// A span that renders as a spinner while a pipeline phase runs.
///
/// Quiet runs get a disabled span, so no spinner is drawn.
pub fn phase(message: &str, quiet: u8) -> Span {
    if quiet > 0 {
        return Span::none();
    }
    let span: Span = info_span!("phase");
    span.pb_set_style(&style());
    span.pb_set_message(message);
    span
}
