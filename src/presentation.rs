//! Descriptive text shown next to the viewport.
//!
//! A pure function of the health state: one of two fixed blocks of text.
//! [`PanelContent::to_html`] renders a block for the webview panel.

use std::fmt::Write;

/// Visual emphasis of a callout box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CalloutTone {
    /// Neutral background fact.
    Info,
    /// Clinically significant warning.
    Warning,
}

/// A highlighted side note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Callout {
    /// Emphasis.
    pub tone: CalloutTone,
    /// Short heading.
    pub heading: &'static str,
    /// Body text.
    pub text: &'static str,
}

/// A titled paragraph with optional bullet points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Section {
    /// Section heading.
    pub heading: &'static str,
    /// Paragraph text.
    pub body: &'static str,
    /// Bullet points following the paragraph.
    pub points: &'static [&'static str],
}

/// One complete panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PanelContent {
    /// Panel title, also used for the window title.
    pub title: &'static str,
    /// One-sentence summary under the title.
    pub summary: &'static str,
    /// Body sections in display order.
    pub sections: &'static [Section],
    /// Highlighted notes after the sections.
    pub callouts: &'static [Callout],
}

static HEALTHY: PanelContent = PanelContent {
    title: "Healthy Kidney",
    summary: "A bean-shaped organ about the size of a fist that filters \
              roughly 180 liters of blood plasma every day.",
    sections: &[
        Section {
            heading: "Anatomy",
            body: "Each kidney sits just below the rib cage on either side \
                   of the spine. The outer cortex and inner medulla hold \
                   about a million nephrons, the filtering units of the \
                   organ.",
            points: &[
                "Length 10-12 cm, weight 120-170 g",
                "Renal hilum: entry for the renal artery, exit for the \
                 renal vein and ureter",
                "Smooth, even surface",
            ],
        },
        Section {
            heading: "Function",
            body: "Kidneys remove waste and excess water as urine and keep \
                   the blood's chemistry in balance.",
            points: &[
                "Regulate electrolytes and acid-base balance",
                "Control blood pressure through the renin system",
                "Produce erythropoietin and activate vitamin D",
            ],
        },
    ],
    callouts: &[Callout {
        tone: CalloutTone::Info,
        heading: "Did you know?",
        text: "A single healthy kidney can do the work of two, which is \
               why living donation is possible.",
    }],
};

static POLYCYSTIC: PanelContent = PanelContent {
    title: "Polycystic Kidney Disease",
    summary: "An inherited disorder in which clusters of fluid-filled \
              cysts grow in the kidneys and gradually crowd out healthy \
              tissue.",
    sections: &[
        Section {
            heading: "What changes",
            body: "Cysts develop along the nephrons and enlarge over \
                   decades. The kidneys can grow to several times their \
                   normal size while filtering capacity falls.",
            points: &[
                "Enlarged, lumpy kidney outline",
                "Hundreds to thousands of cysts of varying size",
                "Healthy tissue compressed between cysts",
            ],
        },
        Section {
            heading: "Causes and symptoms",
            body: "Most cases are autosomal dominant (ADPKD), caused by \
                   mutations in the PKD1 or PKD2 genes.",
            points: &[
                "High blood pressure, often the first sign",
                "Back or side pain and a swollen abdomen",
                "Blood in the urine and kidney stones",
                "Progressive loss of kidney function",
            ],
        },
    ],
    callouts: &[
        Callout {
            tone: CalloutTone::Warning,
            heading: "Kidney failure",
            text: "About half of people with ADPKD reach kidney failure by \
                   age 60 and need dialysis or a transplant.",
        },
        Callout {
            tone: CalloutTone::Info,
            heading: "Treatment",
            text: "Blood pressure control and, for some patients, drugs \
                   that slow cyst growth can delay progression.",
        },
    ],
};

/// Panel for the given health state.
#[must_use]
pub fn panel_for(healthy: bool) -> &'static PanelContent {
    if healthy {
        &HEALTHY
    } else {
        &POLYCYSTIC
    }
}

impl CalloutTone {
    fn class(self) -> &'static str {
        match self {
            Self::Info => "callout info",
            Self::Warning => "callout warning",
        }
    }
}

impl PanelContent {
    /// Render as an HTML fragment (`<article>`), escaping all text.
    #[must_use]
    pub fn to_html(&self) -> String {
        let mut html = String::with_capacity(2048);
        let _ = write!(
            html,
            "<article><h1>{}</h1><p class=\"summary\">{}</p>",
            escape(self.title),
            escape(self.summary)
        );
        for section in self.sections {
            let _ = write!(
                html,
                "<section><h2>{}</h2><p>{}</p>",
                escape(section.heading),
                escape(section.body)
            );
            if !section.points.is_empty() {
                html.push_str("<ul>");
                for point in section.points {
                    let _ = write!(html, "<li>{}</li>", escape(point));
                }
                html.push_str("</ul>");
            }
            html.push_str("</section>");
        }
        for callout in self.callouts {
            let _ = write!(
                html,
                "<aside class=\"{}\"><h3>{}</h3><p>{}</p></aside>",
                callout.tone.class(),
                escape(callout.heading),
                escape(callout.text)
            );
        }
        html.push_str("</article>");
        html
    }
}

/// Minimal HTML text escaping.
fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
