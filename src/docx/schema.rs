//! Element names and child ordering of WordprocessingML property blocks.
//!
//! Word rejects property blocks whose children are out of sequence, so
//! get-or-create accessors insert new children at their ranked position.

pub const BODY: &str = "w:body";
pub const P: &str = "w:p";
pub const P_PR: &str = "w:pPr";
pub const R: &str = "w:r";
pub const R_PR: &str = "w:rPr";
pub const T: &str = "w:t";
pub const BR: &str = "w:br";
pub const SECT_PR: &str = "w:sectPr";
pub const TBL: &str = "w:tbl";
pub const TBL_PR: &str = "w:tblPr";
pub const TBL_GRID: &str = "w:tblGrid";
pub const GRID_COL: &str = "w:gridCol";
pub const TR: &str = "w:tr";
pub const TC: &str = "w:tc";
pub const TC_PR: &str = "w:tcPr";
pub const GRID_SPAN: &str = "w:gridSpan";
pub const V_MERGE: &str = "w:vMerge";
pub const VAL: &str = "w:val";

/// `w:pPr` children in schema order.
pub const P_PR_ORDER: &[&str] = &[
    "w:pStyle",
    "w:keepNext",
    "w:keepLines",
    "w:pageBreakBefore",
    "w:framePr",
    "w:widowControl",
    "w:numPr",
    "w:suppressLineNumbers",
    "w:pBdr",
    "w:shd",
    "w:tabs",
    "w:suppressAutoHyphens",
    "w:kinsoku",
    "w:wordWrap",
    "w:overflowPunct",
    "w:topLinePunct",
    "w:autoSpaceDE",
    "w:autoSpaceDN",
    "w:bidi",
    "w:adjustRightInd",
    "w:snapToGrid",
    "w:spacing",
    "w:ind",
    "w:contextualSpacing",
    "w:mirrorIndents",
    "w:suppressOverlap",
    "w:jc",
    "w:textDirection",
    "w:textAlignment",
    "w:textboxTightWrap",
    "w:outlineLvl",
    "w:divId",
    "w:cnfStyle",
    "w:rPr",
    "w:sectPr",
    "w:pPrChange",
];

/// `w:rPr` children in schema order.
pub const R_PR_ORDER: &[&str] = &[
    "w:rStyle",
    "w:rFonts",
    "w:b",
    "w:bCs",
    "w:i",
    "w:iCs",
    "w:caps",
    "w:smallCaps",
    "w:strike",
    "w:dstrike",
    "w:outline",
    "w:shadow",
    "w:emboss",
    "w:imprint",
    "w:noProof",
    "w:snapToGrid",
    "w:vanish",
    "w:webHidden",
    "w:color",
    "w:spacing",
    "w:w",
    "w:kern",
    "w:position",
    "w:sz",
    "w:szCs",
    "w:highlight",
    "w:u",
    "w:effect",
    "w:bdr",
    "w:shd",
    "w:fitText",
    "w:vertAlign",
    "w:rtl",
    "w:cs",
    "w:em",
    "w:lang",
    "w:eastAsianLayout",
    "w:specVanish",
    "w:oMath",
];

/// `w:sectPr` children in schema order.
pub const SECT_PR_ORDER: &[&str] = &[
    "w:headerReference",
    "w:footerReference",
    "w:footnotePr",
    "w:endnotePr",
    "w:type",
    "w:pgSz",
    "w:pgMar",
    "w:paperSrc",
    "w:pgBorders",
    "w:lnNumType",
    "w:pgNumType",
    "w:cols",
    "w:formProt",
    "w:vAlign",
    "w:noEndnote",
    "w:titlePg",
    "w:textDirection",
    "w:bidi",
    "w:rtlGutter",
    "w:docGrid",
    "w:printerSettings",
    "w:sectPrChange",
];

/// `w:tblPr` children in schema order.
pub const TBL_PR_ORDER: &[&str] = &[
    "w:tblStyle",
    "w:tblpPr",
    "w:tblOverlap",
    "w:bidiVisual",
    "w:tblStyleRowBandSize",
    "w:tblStyleColBandSize",
    "w:tblW",
    "w:jc",
    "w:tblCellSpacing",
    "w:tblInd",
    "w:tblBorders",
    "w:shd",
    "w:tblLayout",
    "w:tblCellMar",
    "w:tblLook",
];

/// `w:tblBorders` children in schema order.
pub const TBL_BORDERS_ORDER: &[&str] = &[
    "w:top", "w:start", "w:left", "w:bottom", "w:end", "w:right", "w:insideH", "w:insideV",
];

/// `w:tblCellMar` children in schema order.
pub const TBL_CELL_MAR_ORDER: &[&str] = &["w:top", "w:start", "w:left", "w:bottom", "w:end", "w:right"];

/// `w:pBdr` children in schema order.
pub const P_BDR_ORDER: &[&str] = &["w:top", "w:left", "w:bottom", "w:right", "w:between", "w:bar"];

/// `w:tcPr` children in schema order.
pub const TC_PR_ORDER: &[&str] = &[
    "w:cnfStyle",
    "w:tcW",
    "w:gridSpan",
    "w:hMerge",
    "w:vMerge",
    "w:tcBorders",
    "w:shd",
    "w:noWrap",
    "w:tcMar",
    "w:textDirection",
    "w:tcFitText",
    "w:vAlign",
    "w:hideMark",
];
