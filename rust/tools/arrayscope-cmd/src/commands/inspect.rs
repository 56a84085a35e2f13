//! Inspect command implementation

use anyhow::{Context, Result};
use arrayscope_buffer::{GrowableArrayBuffer, HeaderSnapshot};
use serde::Serialize;
use std::fmt::Write;

use crate::{OutputFormat, utils::format_size};

#[derive(Serialize)]
struct InspectSummary {
    header: HeaderInfo,
    #[serde(skip_serializing_if = "Option::is_none")]
    layout: Option<LayoutInfo>,
    elements: Vec<ElementInfo>,
}

#[derive(Serialize)]
struct HeaderInfo {
    reference_count: usize,
    count: usize,
    capacity: usize,
    thread_safe_ref_count: bool,
}

#[derive(Serialize)]
struct LayoutInfo {
    capacity_and_flags: usize,
    payload_offset: usize,
    element_size: usize,
    element_align: usize,
    allocation_size: usize,
}

#[derive(Serialize)]
struct ElementInfo {
    index: usize,
    value: i64,
}

/// Run the inspect command
pub fn run(
    verbose: u8,
    values: Vec<i64>,
    capacity: Option<usize>,
    format: OutputFormat,
) -> Result<()> {
    let buffer = build_buffer(&values, capacity)?;
    let output = match format {
        OutputFormat::Text => render_text(&buffer, verbose)?,
        OutputFormat::Json => {
            let summary = create_summary(&buffer, verbose)?;
            serde_json::to_string_pretty(&summary)?
        }
    };
    println!("{output}");
    Ok(())
}

fn build_buffer(values: &[i64], capacity: Option<usize>) -> Result<GrowableArrayBuffer<i64>> {
    let capacity = capacity.unwrap_or(values.len());
    let mut buffer = GrowableArrayBuffer::with_capacity(capacity)
        .with_context(|| format!("Failed to allocate a buffer of capacity {capacity}"))?;
    buffer
        .try_extend(values.iter().copied())
        .context("Failed to append values")?;
    Ok(buffer)
}

fn render_text(buffer: &GrowableArrayBuffer<i64>, verbose: u8) -> Result<String> {
    let header = buffer.header_snapshot()?;
    let mut out = String::new();
    writeln!(out, "Element count: {}", header.count)?;
    writeln!(out, "Capacity: {}", header.capacity)?;
    if verbose > 0 {
        writeln!(out, "Reference count: {}", header.reference_count)?;
        writeln!(
            out,
            "Capacity word: {:#x} (thread-safe ref count: {})",
            header.capacity_and_flags, header.thread_safe_ref_count
        )?;
        writeln!(
            out,
            "Payload offset: {} B, element: {} B (align {}), block: {}",
            header.payload_offset,
            header.element_size,
            header.element_align,
            format_size(header.allocation_size)
        )?;
    }
    write!(out, "{}", "-".repeat(32))?;
    for (_, value) in buffer.introspect()? {
        write!(out, "\nElement: {value}")?;
    }
    Ok(out)
}

fn create_summary(buffer: &GrowableArrayBuffer<i64>, verbose: u8) -> Result<InspectSummary> {
    let header = buffer.header_snapshot()?;
    let elements = buffer
        .introspect()?
        .map(|(index, value)| ElementInfo {
            index,
            value: *value,
        })
        .collect();
    Ok(InspectSummary {
        header: create_header_info(&header),
        layout: (verbose > 0).then(|| create_layout_info(&header)),
        elements,
    })
}

fn create_header_info(header: &HeaderSnapshot) -> HeaderInfo {
    HeaderInfo {
        reference_count: header.reference_count,
        count: header.count,
        capacity: header.capacity,
        thread_safe_ref_count: header.thread_safe_ref_count,
    }
}

fn create_layout_info(header: &HeaderSnapshot) -> LayoutInfo {
    LayoutInfo {
        capacity_and_flags: header.capacity_and_flags,
        payload_offset: header.payload_offset,
        element_size: header.element_size,
        element_align: header.element_align,
        allocation_size: header.allocation_size,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_text() {
        let buffer = build_buffer(&[1, 2, 3], None).unwrap();
        let text = render_text(&buffer, 0).unwrap();
        let expected = format!(
            "Element count: 3\nCapacity: 3\n{}\nElement: 1\nElement: 2\nElement: 3",
            "-".repeat(32)
        );
        assert_eq!(text, expected);
    }

    #[test]
    fn test_render_text_verbose() {
        let buffer = build_buffer(&[7], Some(4)).unwrap();
        let text = render_text(&buffer, 1).unwrap();
        assert!(text.contains("Reference count: 1"));
        assert!(text.contains("Capacity word: 0x8"));
        assert!(text.contains("block: 56 B"));
    }

    #[test]
    fn test_summary_json() {
        let buffer = build_buffer(&[10, 20, 30], Some(2)).unwrap();
        let summary = create_summary(&buffer, 0).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["header"]["count"], 3);
        assert_eq!(json["header"]["capacity"], 4);
        assert_eq!(json["elements"][2]["index"], 2);
        assert_eq!(json["elements"][2]["value"], 30);
        assert!(json.get("layout").is_none());

        let summary = create_summary(&buffer, 1).unwrap();
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["layout"]["element_size"], 8);
    }
}
