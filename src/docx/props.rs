pub const PPR_ORDER: &[&str] = &[
    "pStyle",
    "keepNext",
    "keepLines",
    "pageBreakBefore",
    "framePr",
    "widowControl",
    "numPr",
    "suppressLineNumbers",
    "pBdr",
    "shd",
    "tabs",
    "suppressAutoHyphens",
    "kinsoku",
    "wordWrap",
    "overflowPunct",
    "topLinePunct",
    "autoSpaceDE",
    "autoSpaceDN",
    "bidi",
    "adjustRightInd",
    "snapToGrid",
    "spacing",
    "ind",
    "contextualSpacing",
    "mirrorIndents",
    "suppressOverlap",
    "jc",
    "textDirection",
    "textAlignment",
    "textboxTightWrap",
    "outlineLvl",
    "divId",
    "cnfStyle",
    "rPr",
    "sectPr",
    "pPrChange",
];

pub const RPR_ORDER: &[&str] = &[
    "rStyle",
    "rFonts",
    "b",
    "bCs",
    "i",
    "iCs",
    "caps",
    "smallCaps",
    "strike",
    "dstrike",
    "outline",
    "shadow",
    "emboss",
    "imprint",
    "noProof",
    "snapToGrid",
    "vanish",
    "webHidden",
    "color",
    "spacing",
    "w",
    "kern",
    "position",
    "sz",
    "szCs",
    "highlight",
    "u",
    "effect",
    "bdr",
    "shd",
    "fitText",
    "vertAlign",
    "rtl",
    "cs",
    "em",
    "lang",
    "eastAsianLayout",
    "specVanish",
    "oMath",
];

pub const TCPR_ORDER: &[&str] = &[
    "cnfStyle",
    "tcW",
    "gridSpan",
    "hMerge",
    "vMerge",
    "tcBorders",
    "shd",
    "noWrap",
    "tcMar",
    "textDirection",
    "tcFitText",
    "vAlign",
    "hideMark",
];

pub const TRPR_ORDER: &[&str] = &[
    "cnfStyle",
    "divId",
    "gridBefore",
    "gridAfter",
    "wBefore",
    "wAfter",
    "cantSplit",
    "trHeight",
    "tblHeader",
    "tblCellSpacing",
    "jc",
    "hidden",
];

pub const TBLPR_ORDER: &[&str] = &[
    "tblStyle",
    "tblpPr",
    "tblOverlap",
    "bidiVisual",
    "tblStyleRowBandSize",
    "tblStyleColBandSize",
    "tblW",
    "jc",
    "tblCellSpacing",
    "tblInd",
    "tblBorders",
    "shd",
    "tblLayout",
    "tblCellMar",
    "tblLook",
    "tblCaption",
    "tblDescription",
];

#[derive(Debug, Clone, PartialEq)]
pub struct PropertyNode {
    pub name: String,
    pub attrs: Vec<(String, String)>,
    pub raw: Option<String>,
}

impl PropertyNode {
    pub fn flag(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attrs: Vec::new(),
            raw: None,
        }
    }

    pub fn with_val(name: &str, value: &str) -> Self {
        Self::with_attrs(name, &[("w:val", value)])
    }

    pub fn with_attrs(name: &str, attrs: &[(&str, &str)]) -> Self {
        Self {
            name: name.to_string(),
            attrs: attrs
                .iter()
                .map(|(key, value)| (key.to_string(), value.to_string()))
                .collect(),
            raw: None,
        }
    }

    pub fn attr(&self, key: &str) -> Option<&str> {
        self.attrs
            .iter()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.as_str())
    }

    pub fn val(&self) -> Option<&str> {
        self.attr("w:val")
    }

    // Toggle properties (b, keepNext, tblHeader) are on unless w:val says otherwise.
    pub fn is_on(&self) -> bool {
        !matches!(self.val(), Some("0" | "false" | "off"))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PropertyBag {
    nodes: Vec<PropertyNode>,
}

impl PropertyBag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_nodes(nodes: Vec<PropertyNode>) -> Self {
        Self { nodes }
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PropertyNode> {
        self.nodes.iter()
    }

    pub fn get(&self, name: &str) -> Option<&PropertyNode> {
        self.nodes.iter().find(|node| node.name == name)
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn val(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(PropertyNode::val)
    }

    pub fn set(&mut self, node: PropertyNode, order: &[&str]) {
        if let Some(existing) = self.nodes.iter_mut().find(|item| item.name == node.name) {
            *existing = node;
            return;
        }

        let rank = order.iter().position(|name| *name == node.name);
        let insert_at = match rank {
            Some(rank) => self
                .nodes
                .iter()
                .position(|item| {
                    order
                        .iter()
                        .position(|name| *name == item.name)
                        .is_some_and(|item_rank| item_rank > rank)
                })
                .unwrap_or(self.nodes.len()),
            None => self.nodes.len(),
        };
        self.nodes.insert(insert_at, node);
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.nodes.len();
        self.nodes.retain(|node| node.name != name);
        before != self.nodes.len()
    }
}
