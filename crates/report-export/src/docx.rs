//! Minimal WordprocessingML package writer.
//!
//! Produces the handful of OOXML parts Word needs for headings, paragraphs
//! with bold runs and one inline PNG, zipped into a `.docx`.

use crate::{CompanyReport, ExportError};
use analysis_core::{clean_text, format_number, MetricStyle, NOT_AVAILABLE};
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// 6 inches in English Metric Units
const CHART_WIDTH_EMU: u64 = 5_486_400;
const CHART_REL_ID: &str = "rId2";
const CHART_PART: &str = "word/media/chart.png";
const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Default Extension="png" ContentType="image/png"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="120"/></w:pPr><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:sz w:val="52"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="360" w:after="80"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:color w:val="365F91"/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:next w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="60"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:color w:val="4F81BD"/><w:sz w:val="26"/></w:rPr></w:style></w:styles>"#;

/// Render the report as a `.docx` file.
///
/// `chart_png` is embedded six inches wide when it is a PNG; anything else
/// gets a short note in place of the image.
pub fn build_word_report(
    report: &CompanyReport,
    chart_png: Option<&[u8]>,
) -> Result<Vec<u8>, ExportError> {
    let mut body = Body::default();
    let metrics = &report.metrics;

    body.heading(&report.title(), 0);

    body.heading("Company Overview", 1);
    body.paragraph(&format!("Industry: {}", metrics.industry.as_deref().unwrap_or(NOT_AVAILABLE)));
    body.paragraph(&format!("Sector: {}", metrics.sector.as_deref().unwrap_or(NOT_AVAILABLE)));
    body.paragraph(&format!("Market Cap: {}", format_number(metrics.market_cap, MetricStyle::Usd)));
    body.paragraph(&format!(
        "Current Price: {}",
        format_number(report.closing_price, MetricStyle::Usd)
    ));

    body.heading("Key Financial Metrics", 1);
    let key_metrics = [
        ("Trailing PE", metrics.trailing_pe, MetricStyle::Ratio),
        ("Forward PE", metrics.forward_pe, MetricStyle::Ratio),
        ("Return on Equity (ROE)", metrics.return_on_equity, MetricStyle::Percent),
        ("Gross Margin", metrics.gross_margins, MetricStyle::Percent),
        ("Operating Margin", metrics.operating_margins, MetricStyle::Percent),
        ("Debt to Equity", metrics.debt_to_equity, MetricStyle::Ratio),
        ("PEG Ratio (from Yahoo)", report.peg, MetricStyle::Ratio),
    ];
    for (label, value, style) in key_metrics {
        body.labelled(label, &format_number(value, style));
    }

    if let Some(benchmark) = &report.benchmark {
        body.heading("Sector Benchmark Comparison", 1);
        body.labelled("ETF", &format!("{} ({})", benchmark.name, benchmark.benchmark));
        body.labelled("PE Ratio", &format_number(benchmark.pe, MetricStyle::Ratio));
        body.labelled("PB Ratio", &format_number(benchmark.pb, MetricStyle::Ratio));
        body.labelled("ROE", &format_number(benchmark.roe, MetricStyle::Percent));
    }

    if let Some(targets) = &report.targets {
        body.heading("Analyst Price Targets", 1);
        body.paragraph(&format!(
            "Target Range: ${:.2} - ${:.2}",
            targets.low.unwrap_or(0.0),
            targets.high.unwrap_or(0.0)
        ));
        body.paragraph(&format!("Average Target: ${:.2}", targets.mean.unwrap_or(0.0)));
    }

    if let Some(valuation) = report.valuation {
        body.paragraph(&format!("Valuation: {}", valuation.capitalized()));
    }

    body.heading("AI Investment Summary", 1);
    let blocks = summary_blocks(&report.ai_summary);
    if blocks.is_empty() {
        body.paragraph("Summary not available.");
    }
    for block in blocks {
        match block {
            SummaryBlock::Heading(text) => body.heading(&text, 2),
            SummaryBlock::Labelled(label, rest) => body.labelled(&label, &rest),
            SummaryBlock::Text(text) => body.paragraph(&text),
        }
    }

    let mut chart = None;
    if let Some(bytes) = chart_png {
        body.heading("Selected Stock Price Chart", 1);
        match png_dimensions(bytes) {
            Some((width, height)) => {
                let cy = CHART_WIDTH_EMU * u64::from(height) / u64::from(width);
                body.picture(CHART_REL_ID, CHART_WIDTH_EMU, cy);
                body.paragraph(&format!("Time Range Selected: {}", report.time_range.label()));
                chart = Some(bytes);
            }
            None => {
                tracing::warn!("Chart for {} is not a PNG, skipping image", report.ticker);
                body.paragraph("Chart image format not recognized.");
            }
        }
    }

    write_package(&body.into_document(), chart)
}

fn write_package(document: &str, chart: Option<&[u8]>) -> Result<Vec<u8>, ExportError> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    zip.start_file("[Content_Types].xml", options)?;
    zip.write_all(CONTENT_TYPES.as_bytes())?;

    zip.start_file("_rels/.rels", options)?;
    zip.write_all(PACKAGE_RELS.as_bytes())?;

    zip.start_file("word/document.xml", options)?;
    zip.write_all(document.as_bytes())?;

    zip.start_file("word/styles.xml", options)?;
    zip.write_all(STYLES.as_bytes())?;

    zip.start_file("word/_rels/document.xml.rels", options)?;
    zip.write_all(document_rels(chart.is_some()).as_bytes())?;

    if let Some(bytes) = chart {
        // already compressed
        let stored = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
        zip.start_file(CHART_PART, stored)?;
        zip.write_all(bytes)?;
    }

    Ok(zip.finish()?.into_inner())
}

fn document_rels(with_chart: bool) -> String {
    let mut rels = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/>"#,
    );
    if with_chart {
        rels.push_str(&format!(
            r#"<Relationship Id="{}" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/image" Target="media/chart.png"/>"#,
            CHART_REL_ID
        ));
    }
    rels.push_str("</Relationships>");
    rels
}

/// Width and height from the IHDR chunk, or `None` when `bytes` is not a PNG.
fn png_dimensions(bytes: &[u8]) -> Option<(u32, u32)> {
    if bytes.len() < 24 || bytes[..8] != PNG_SIGNATURE || &bytes[12..16] != b"IHDR" {
        return None;
    }
    let width = u32::from_be_bytes(bytes[16..20].try_into().ok()?);
    let height = u32::from_be_bytes(bytes[20..24].try_into().ok()?);
    if width == 0 || height == 0 {
        return None;
    }
    Some((width, height))
}

#[derive(Debug, PartialEq)]
enum SummaryBlock {
    Heading(String),
    Labelled(String, String),
    Text(String),
}

/// Split a generated summary into document blocks.
///
/// `**Heading**` lines become headings, `**Label:** rest` lines become a
/// bold label followed by text, blank lines are dropped.
fn summary_blocks(summary: &str) -> Vec<SummaryBlock> {
    clean_text(summary)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| {
            if line.starts_with("**") && line.ends_with("**") {
                SummaryBlock::Heading(line.trim_matches(|c: char| c == '*' || c == ' ').to_string())
            } else if line.starts_with("**") && line.contains(":**") {
                let mut parts = line.trim_matches('*').split(":**");
                let label = parts.next().unwrap_or_default().trim().to_string();
                let rest = parts.next().unwrap_or_default().trim().to_string();
                SummaryBlock::Labelled(label, rest)
            } else {
                SummaryBlock::Text(line.to_string())
            }
        })
        .collect()
}

#[derive(Default)]
struct Body {
    xml: String,
    pictures: u32,
}

impl Body {
    fn heading(&mut self, text: &str, level: u8) {
        let style = match level {
            0 => "Title".to_string(),
            n => format!("Heading{}", n),
        };
        self.xml.push_str(&format!(
            r#"<w:p><w:pPr><w:pStyle w:val="{}"/></w:pPr>{}</w:p>"#,
            style,
            run(text, false)
        ));
    }

    fn paragraph(&mut self, text: &str) {
        self.xml.push_str(&format!("<w:p>{}</w:p>", run(text, false)));
    }

    /// Bold "label: " followed by plain text
    fn labelled(&mut self, label: &str, value: &str) {
        self.xml.push_str(&format!(
            "<w:p>{}{}</w:p>",
            run(&format!("{}: ", label), true),
            run(value, false)
        ));
    }

    fn picture(&mut self, rel_id: &str, cx: u64, cy: u64) {
        self.pictures += 1;
        let id = self.pictures;
        self.xml.push_str(&format!(
            concat!(
                r#"<w:p><w:r><w:drawing><wp:inline distT="0" distB="0" distL="0" distR="0">"#,
                r#"<wp:extent cx="{cx}" cy="{cy}"/><wp:docPr id="{id}" name="Chart {id}"/>"#,
                r#"<a:graphic><a:graphicData uri="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                r#"<pic:pic><pic:nvPicPr><pic:cNvPr id="0" name="chart.png"/><pic:cNvPicPr/></pic:nvPicPr>"#,
                r#"<pic:blipFill><a:blip r:embed="{rel}"/><a:stretch><a:fillRect/></a:stretch></pic:blipFill>"#,
                r#"<pic:spPr><a:xfrm><a:off x="0" y="0"/><a:ext cx="{cx}" cy="{cy}"/></a:xfrm>"#,
                r#"<a:prstGeom prst="rect"><a:avLst/></a:prstGeom></pic:spPr></pic:pic>"#,
                r#"</a:graphicData></a:graphic></wp:inline></w:drawing></w:r></w:p>"#
            ),
            cx = cx,
            cy = cy,
            id = id,
            rel = rel_id
        ));
    }

    fn into_document(self) -> String {
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>"#,
                "\n",
                r#"<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main" "#,
                r#"xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships" "#,
                r#"xmlns:wp="http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing" "#,
                r#"xmlns:a="http://schemas.openxmlformats.org/drawingml/2006/main" "#,
                r#"xmlns:pic="http://schemas.openxmlformats.org/drawingml/2006/picture">"#,
                "<w:body>{}",
                r#"<w:sectPr><w:pgSz w:w="12240" w:h="15840"/>"#,
                r#"<w:pgMar w:top="1440" w:right="1440" w:bottom="1440" w:left="1440" w:header="720" w:footer="720" w:gutter="0"/>"#,
                "</w:sectPr></w:body></w:document>"
            ),
            self.xml
        )
    }
}

fn run(text: &str, bold: bool) -> String {
    let props = if bold { "<w:rPr><w:b/></w:rPr>" } else { "" };
    format!(
        r#"<w:r>{}<w:t xml:space="preserve">{}</w:t></w:r>"#,
        props,
        escape_xml(text)
    )
}

fn escape_xml(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use super::*;
    use analysis_core::{AnalystTargets, BenchmarkMetrics, CompanyMetrics, TimeRange, ValuationLabel};
    use std::io::Read;
    use zip::ZipArchive;

    fn sample_report() -> CompanyReport {
        CompanyReport {
            ticker: "AAPL".to_string(),
            metrics: CompanyMetrics {
                ticker: "AAPL".to_string(),
                short_name: Some("Apple Inc.".to_string()),
                sector: Some("Technology".to_string()),
                industry: Some("Consumer Electronics".to_string()),
                market_cap: Some(3_000_000_000_000.0),
                trailing_pe: Some(29.5),
                return_on_equity: Some(0.25),
                ..Default::default()
            },
            closing_price: Some(190.0),
            peg: Some(2.1),
            benchmark: Some(BenchmarkMetrics {
                benchmark: "XLK".to_string(),
                name: "Technology Select Sector SPDR Fund".to_string(),
                pe: Some(35.2),
                pb: None,
                roe: Some(0.31),
            }),
            targets: Some(AnalystTargets {
                low: Some(150.0),
                high: Some(250.0),
                mean: Some(205.5),
                median: None,
            }),
            valuation: Some(ValuationLabel::SlightlyOvervalued),
            ai_summary: "**1. Company Overview**\n**Sector:** Technology & hardware\n\nSolid balance sheet.\n**AI Verdict: Hold**".to_string(),
            time_range: TimeRange::SixMonths,
            ..Default::default()
        }
    }

    fn tiny_png(width: u32, height: u32) -> Vec<u8> {
        let mut bytes = PNG_SIGNATURE.to_vec();
        bytes.extend_from_slice(&13u32.to_be_bytes());
        bytes.extend_from_slice(b"IHDR");
        bytes.extend_from_slice(&width.to_be_bytes());
        bytes.extend_from_slice(&height.to_be_bytes());
        bytes.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
        bytes
    }

    fn read_part(docx: &[u8], name: &str) -> Option<String> {
        let mut archive = ZipArchive::new(Cursor::new(docx)).unwrap();
        let mut file = archive.by_name(name).ok()?;
        let mut content = String::new();
        file.read_to_string(&mut content).unwrap();
        Some(content)
    }

    #[test]
    fn test_document_sections() {
        let docx = build_word_report(&sample_report(), None).unwrap();
        let xml = read_part(&docx, "word/document.xml").unwrap();

        assert!(xml.contains("Apple Inc. (AAPL) Financial Report"));
        assert!(xml.contains("Industry: Consumer Electronics"));
        assert!(xml.contains("Market Cap: $3,000,000,000,000.00"));
        assert!(xml.contains("Current Price: $190.00"));
        assert!(xml.contains("Trailing PE: "));
        assert!(xml.contains("25.0%"));
        assert!(xml.contains("Technology Select Sector SPDR Fund (XLK)"));
        assert!(xml.contains("Target Range: $150.00 - $250.00"));
        assert!(xml.contains("Average Target: $205.50"));
        assert!(xml.contains("Valuation: Slightly overvalued"));
        assert!(xml.contains("Technology &amp; hardware"));
        assert!(!xml.contains("Selected Stock Price Chart"));
        assert!(read_part(&docx, CHART_PART).is_none());
    }

    #[test]
    fn test_optional_sections_omitted() {
        let report = CompanyReport {
            ticker: "XYZ".to_string(),
            ..Default::default()
        };
        let docx = build_word_report(&report, None).unwrap();
        let xml = read_part(&docx, "word/document.xml").unwrap();

        assert!(xml.contains(" (XYZ) Financial Report"));
        assert!(xml.contains("Industry: N/A"));
        assert!(!xml.contains("Sector Benchmark Comparison"));
        assert!(!xml.contains("Analyst Price Targets"));
        assert!(!xml.contains("Valuation:"));
        assert!(xml.contains("Summary not available."));
    }

    #[test]
    fn test_chart_embedded_six_inches_wide() {
        let png = tiny_png(800, 400);
        let docx = build_word_report(&sample_report(), Some(png.as_slice())).unwrap();
        let xml = read_part(&docx, "word/document.xml").unwrap();
        let rels = read_part(&docx, "word/_rels/document.xml.rels").unwrap();

        assert!(xml.contains(r#"<wp:extent cx="5486400" cy="2743200"/>"#));
        assert!(xml.contains("Time Range Selected: 6M"));
        assert!(rels.contains("media/chart.png"));

        let mut archive = ZipArchive::new(Cursor::new(docx.as_slice())).unwrap();
        assert_eq!(archive.by_name(CHART_PART).unwrap().size(), png.len() as u64);
    }

    #[test]
    fn test_non_png_chart_noted() {
        let docx = build_word_report(&sample_report(), Some(b"GIF89a....".as_slice())).unwrap();
        let xml = read_part(&docx, "word/document.xml").unwrap();

        assert!(xml.contains("Chart image format not recognized."));
        assert!(!xml.contains("<w:drawing>"));
    }

    #[test]
    fn test_summary_blocks() {
        let blocks = summary_blocks("**2. Financial Health**\n**ROE:** 25%\n  \nGood margins.");
        assert_eq!(
            blocks,
            vec![
                SummaryBlock::Heading("2. Financial Health".to_string()),
                SummaryBlock::Labelled("ROE".to_string(), "25%".to_string()),
                SummaryBlock::Text("Good margins.".to_string()),
            ]
        );
    }
}
