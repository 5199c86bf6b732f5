//! NCX navigation document.

use std::fmt::Write;

use quick_xml::escape::escape;

/// A resolved navigation point: label, `content src` and play order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NavPoint {
    pub label: String,
    pub src: String,
    pub play_order: u32,
    pub children: Vec<NavPoint>,
}

impl NavPoint {
    fn depth(&self) -> usize {
        1 + self.children.iter().map(NavPoint::depth).max().unwrap_or(0)
    }
}

/// Render `toc.ncx`.
pub fn generate_ncx(uid: &str, title: &str, points: &[NavPoint]) -> String {
    let depth = points.iter().map(NavPoint::depth).max().unwrap_or(1);
    let mut ncx = String::new();

    ncx.push_str(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE ncx PUBLIC "-//NISO//DTD ncx 2005-1//EN" "http://www.daisy.org/z3986/2005/ncx-2005-1.dtd">
<ncx xmlns="http://www.daisy.org/z3986/2005/ncx/" version="2005-1">
  <head>
"#,
    );
    let _ = writeln!(ncx, "    <meta name=\"dtb:uid\" content=\"{}\"/>", escape(uid));
    let _ = writeln!(ncx, "    <meta name=\"dtb:depth\" content=\"{depth}\"/>");
    ncx.push_str(
        r#"    <meta name="dtb:totalPageCount" content="0"/>
    <meta name="dtb:maxPageNumber" content="0"/>
  </head>
  <docTitle>
"#,
    );
    let _ = writeln!(ncx, "    <text>{}</text>", escape(title));
    ncx.push_str("  </docTitle>\n  <navMap>\n");

    let mut counter = 1;
    write_nav_points(&mut ncx, points, &mut counter, 2);

    ncx.push_str("  </navMap>\n</ncx>\n");
    ncx
}

fn write_nav_points(ncx: &mut String, points: &[NavPoint], counter: &mut usize, indent: usize) {
    let pad = "  ".repeat(indent);

    for point in points {
        let _ = writeln!(
            ncx,
            "{pad}<navPoint id=\"navPoint-{counter}\" playOrder=\"{}\">",
            point.play_order
        );
        let _ = writeln!(
            ncx,
            "{pad}  <navLabel><text>{}</text></navLabel>",
            escape(point.label.as_str())
        );
        let _ = writeln!(ncx, "{pad}  <content src=\"{}\"/>", escape(point.src.as_str()));
        *counter += 1;

        write_nav_points(ncx, &point.children, counter, indent + 1);

        let _ = writeln!(ncx, "{pad}</navPoint>");
    }
}
