//! Raster export of a diagram as PNG.
//!
//! Nodes are drawn as boxes tinted with their renderer color and outlined in
//! it; edges are straight lines between node centers in their stroke color.
//! Text is not rendered.

use archboard_core::{style_for, DiagramGraph, Position};

pub const NODE_WIDTH: u32 = 180;
pub const NODE_HEIGHT: u32 = 72;
const MARGIN: u32 = 40;
const BORDER: u32 = 2;
const MAX_SIDE: u32 = 4096;
const BACKGROUND: Rgb = Rgb(0xf8, 0xfa, 0xfc);
const FALLBACK_STROKE: Rgb = Rgb(0x64, 0x74, 0x8b);

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("diagram is too large to rasterize ({width}x{height})")]
    TooLarge { width: u64, height: u64 },

    #[error("png encoding failed: {0}")]
    Encode(#[from] png::EncodingError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb(pub u8, pub u8, pub u8);

impl Rgb {
    /// Parses `#rrggbb`.
    pub fn parse(hex: &str) -> Option<Rgb> {
        let hex = hex.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        Some(Rgb(channel(0)?, channel(2)?, channel(4)?))
    }

    /// Blends toward white; `amount` 0 keeps the color, 255 gives white.
    fn lighten(self, amount: u8) -> Rgb {
        let mix = |c: u8| {
            let c = c as u16;
            (c + (255 - c) * amount as u16 / 255) as u8
        };
        Rgb(mix(self.0), mix(self.1), mix(self.2))
    }
}

struct Canvas {
    width: u32,
    height: u32,
    pixels: Vec<u8>,
}

impl Canvas {
    fn new(width: u32, height: u32, fill: Rgb) -> Self {
        let mut pixels = Vec::with_capacity(width as usize * height as usize * 4);
        for _ in 0..(width as usize * height as usize) {
            pixels.extend_from_slice(&[fill.0, fill.1, fill.2, 0xff]);
        }
        Canvas {
            width,
            height,
            pixels,
        }
    }

    fn put(&mut self, x: i64, y: i64, color: Rgb) {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return;
        }
        let at = (y as usize * self.width as usize + x as usize) * 4;
        self.pixels[at..at + 3].copy_from_slice(&[color.0, color.1, color.2]);
    }

    fn fill_rect(&mut self, x: i64, y: i64, w: u32, h: u32, color: Rgb) {
        for py in y..y + h as i64 {
            for px in x..x + w as i64 {
                self.put(px, py, color);
            }
        }
    }

    /// Bresenham line, thickened by one pixel on each side.
    fn line(&mut self, (x0, y0): (i64, i64), (x1, y1): (i64, i64), color: Rgb) {
        let dx = (x1 - x0).abs();
        let dy = -(y1 - y0).abs();
        let sx = if x0 < x1 { 1 } else { -1 };
        let sy = if y0 < y1 { 1 } else { -1 };
        let (mut x, mut y) = (x0, y0);
        let mut err = dx + dy;
        loop {
            for (ox, oy) in [(0, 0), (1, 0), (0, 1)] {
                self.put(x + ox, y + oy, color);
            }
            if x == x1 && y == y1 {
                break;
            }
            let e2 = 2 * err;
            if e2 >= dy {
                err += dy;
                x += sx;
            }
            if e2 <= dx {
                err += dx;
                y += sy;
            }
        }
    }

    fn encode(&self) -> Result<Vec<u8>, ExportError> {
        let mut out = Vec::new();
        {
            let mut encoder = png::Encoder::new(&mut out, self.width, self.height);
            encoder.set_color(png::ColorType::Rgba);
            encoder.set_depth(png::BitDepth::Eight);
            let mut writer = encoder.write_header()?;
            writer.write_image_data(&self.pixels)?;
            writer.finish()?;
        }
        Ok(out)
    }
}

/// Renders `graph` to PNG bytes. An empty graph yields a blank canvas.
pub fn render_png(graph: &DiagramGraph) -> Result<Vec<u8>, ExportError> {
    let (min, max) = match bounds(graph) {
        Some(b) => b,
        None => return Canvas::new(MARGIN * 2, MARGIN * 2, BACKGROUND).encode(),
    };
    // Sized in f64: positions are any finite floats, so the span may not fit
    // an integer.
    let side = |span: f64, node: u32| span.ceil() + f64::from(node) + f64::from(2 * MARGIN);
    let width = side(max.x - min.x, NODE_WIDTH);
    let height = side(max.y - min.y, NODE_HEIGHT);
    if !(width <= f64::from(MAX_SIDE) && height <= f64::from(MAX_SIDE)) {
        return Err(ExportError::TooLarge {
            width: width as u64,
            height: height as u64,
        });
    }
    let mut canvas = Canvas::new(width as u32, height as u32, BACKGROUND);
    let origin = |p: &Position| {
        (
            (p.x - min.x).round() as i64 + MARGIN as i64,
            (p.y - min.y).round() as i64 + MARGIN as i64,
        )
    };
    let center = |p: &Position| {
        let (x, y) = origin(p);
        (x + NODE_WIDTH as i64 / 2, y + NODE_HEIGHT as i64 / 2)
    };

    for edge in graph.edges() {
        let (Some(source), Some(target)) = (graph.node(&edge.source), graph.node(&edge.target))
        else {
            continue;
        };
        let color = Rgb::parse(&edge.style.stroke).unwrap_or(FALLBACK_STROKE);
        canvas.line(center(&source.position), center(&target.position), color);
    }

    for node in graph.nodes() {
        let accent = Rgb::parse(style_for(&node.kind).color).unwrap_or(FALLBACK_STROKE);
        let (x, y) = origin(&node.position);
        canvas.fill_rect(x, y, NODE_WIDTH, NODE_HEIGHT, accent);
        canvas.fill_rect(
            x + BORDER as i64,
            y + BORDER as i64,
            NODE_WIDTH - 2 * BORDER,
            NODE_HEIGHT - 2 * BORDER,
            accent.lighten(200),
        );
    }

    canvas.encode()
}

fn bounds(graph: &DiagramGraph) -> Option<(Position, Position)> {
    let mut nodes = graph.nodes();
    let first = nodes.next()?.position;
    let (mut min, mut max) = (first, first);
    for node in nodes {
        min.x = min.x.min(node.position.x);
        min.y = min.y.min(node.position.y);
        max.x = max.x.max(node.position.x);
        max.y = max.y.max(node.position.y);
    }
    Some((min, max))
}

#[cfg(test)]
mod tests {
    use super::*;
    use archboard_core::{DiagramKind, NodeKind};

    fn decode(bytes: &[u8]) -> (u32, u32, Vec<u8>) {
        let decoder = png::Decoder::new(std::io::Cursor::new(bytes));
        let mut reader = decoder.read_info().unwrap();
        let (width, height) = (reader.info().width, reader.info().height);
        let mut buf = vec![0; width as usize * height as usize * 4];
        let info = reader.next_frame(&mut buf).unwrap();
        buf.truncate(info.buffer_size());
        (info.width, info.height, buf)
    }

    fn pixel(buf: &[u8], width: u32, x: u32, y: u32) -> Rgb {
        let at = ((y * width + x) * 4) as usize;
        Rgb(buf[at], buf[at + 1], buf[at + 2])
    }

    #[test]
    fn parses_hex_colors() {
        assert_eq!(Rgb::parse("#16a34a"), Some(Rgb(0x16, 0xa3, 0x4a)));
        assert_eq!(Rgb::parse("16a34a"), None);
        assert_eq!(Rgb::parse("#fff"), None);
        assert_eq!(Rgb::parse("#zzzzzz"), None);
    }

    #[test]
    fn empty_graph_is_blank_canvas() {
        let bytes = render_png(&DiagramGraph::new()).unwrap();
        let (w, h, buf) = decode(&bytes);
        assert_eq!((w, h), (MARGIN * 2, MARGIN * 2));
        assert_eq!(pixel(&buf, w, 10, 10), BACKGROUND);
    }

    #[test]
    fn canvas_fits_nodes_and_uses_their_colors() {
        let mut graph = DiagramGraph::new();
        let a = graph.add_node(NodeKind::Api, Position::new(100.0, 100.0));
        let b = graph.add_node(NodeKind::Database, Position::new(400.0, 250.0));
        graph
            .connect(&a, &b, None, None, DiagramKind::Architecture)
            .unwrap();

        let (w, h, buf) = decode(&render_png(&graph).unwrap());
        assert_eq!(w, 300 + NODE_WIDTH + 2 * MARGIN);
        assert_eq!(h, 150 + NODE_HEIGHT + 2 * MARGIN);

        let accent = Rgb::parse(style_for(&NodeKind::Api).color).unwrap();
        assert_eq!(pixel(&buf, w, MARGIN, MARGIN), accent);
        assert_eq!(pixel(&buf, w, MARGIN + 20, MARGIN + 20), accent.lighten(200));
        assert_eq!(pixel(&buf, w, 0, h - 1), BACKGROUND);
    }

    #[test]
    fn far_apart_nodes_are_rejected() {
        let mut graph = DiagramGraph::new();
        graph.add_node(NodeKind::Api, Position::new(0.0, 0.0));
        graph.add_node(NodeKind::Api, Position::new(100_000.0, 0.0));
        assert!(matches!(
            render_png(&graph),
            Err(ExportError::TooLarge { .. })
        ));
    }

    #[test]
    fn extreme_positions_are_rejected_without_overflow() {
        for (a, b) in [(-1e300, 1e300), (-f64::MAX, f64::MAX)] {
            let mut graph = DiagramGraph::new();
            graph.add_node(NodeKind::Api, Position::new(a, 0.0));
            graph.add_node(NodeKind::Database, Position::new(b, b));
            match render_png(&graph) {
                Err(ExportError::TooLarge { width, height }) => {
                    assert!(width > MAX_SIDE as u64);
                    assert!(height > MAX_SIDE as u64);
                }
                other => panic!("expected TooLarge, got {:?}", other.map(|bytes| bytes.len())),
            }
        }
    }
}
