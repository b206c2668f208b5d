//! Content-stream interpreter: the text state machine.
//!
//! Consumes a parsed operator stream and emits positioned [`Mark`]s. The
//! machine tracks the text matrix (Tm), text line matrix (Tlm), current
//! transformation matrix (CTM), and the text/graphics parameters the PDF
//! text operators manipulate. Errors are best-effort: a malformed operator
//! is logged and skipped; per-string failures are recorded on the output
//! and the remaining operators still run.

use std::sync::Arc;

use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::error::{ExtractError, Result, MAX_FORM_DEPTH};
use crate::font::{BuiltinFont, Font, FontCache};
use crate::layout::mark::Mark;
use crate::model::objects::{ContentOp, Operand};
use crate::model::state::{Color, GraphicState, TextState};
use crate::params::ExtractParams;
use crate::utils::{
    apply_matrix_rect, matrix_scale_x, matrix_scale_y, matrix_angle, matrix_translation,
    mult_matrix, rect_intersection, rect_normalize, rotation_matrix, translate_matrix, Matrix,
    Rect, MATRIX_IDENTITY,
};

/// Kind of an XObject resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum XObjectKind {
    Image,
    Form,
}

/// A Form XObject: its content pre-parsed into operators, plus its own
/// resource dictionary when it carries one.
#[derive(Clone)]
pub struct Form {
    pub ops: Vec<ContentOp>,
    pub resources: Option<Arc<dyn Resources>>,
}

/// Contract the interpreter consumes from an external resource dictionary.
pub trait Resources: Send + Sync {
    /// The font registered under a resource name, if any.
    fn get_font(&self, name: &str) -> Option<Arc<dyn Font>>;

    /// The kind of the XObject registered under a resource name.
    fn get_xobject(&self, name: &str) -> Option<XObjectKind>;

    /// The Form XObject registered under a resource name.
    fn get_form(&self, name: &str) -> Option<Form>;
}

/// Everything the interpreter produced for one content stream.
#[derive(Debug, Default)]
pub struct InterpreterOutput {
    /// Marks in stream order.
    pub marks: Vec<Mark>,
    /// Glyphs rendered.
    pub num_chars: usize,
    /// Charcodes that had no Unicode mapping.
    pub num_misses: usize,
    /// Errors recorded along the way; extraction continued past each.
    pub errors: Vec<ExtractError>,
}

type SavedState = (Matrix, TextState, GraphicState);

#[derive(Clone)]
struct FormResult {
    marks: Vec<Mark>,
    num_chars: usize,
    num_misses: usize,
}

/// Memo key: form name plus the exact CTM it was rendered under.
type FormKey = (String, [u64; 6]);

fn ctm_bits(m: Matrix) -> [u64; 6] {
    [
        m.0.to_bits(),
        m.1.to_bits(),
        m.2.to_bits(),
        m.3.to_bits(),
        m.4.to_bits(),
        m.5.to_bits(),
    ]
}

/// The text state machine.
pub struct Interpreter<'a> {
    params: &'a ExtractParams,
    media_box: Rect,
    resources: Arc<dyn Resources>,
    font_cache: Option<&'a mut FontCache>,

    ctm: Matrix,
    text: TextState,
    graphics: GraphicState,
    /// `q`/`Q` stack; real streams rarely nest more than a few levels.
    gstack: SmallVec<[SavedState; 4]>,
    in_text_object: bool,

    /// Marks of the open text object, flushed on ET/BT/finish.
    object_marks: Vec<Mark>,
    marks: Vec<Mark>,

    form_memo: FxHashMap<FormKey, FormResult>,
    form_depth: usize,

    num_chars: usize,
    num_misses: usize,
    errors: Vec<ExtractError>,
}

impl<'a> Interpreter<'a> {
    pub fn new(
        resources: Arc<dyn Resources>,
        media_box: Rect,
        params: &'a ExtractParams,
        font_cache: Option<&'a mut FontCache>,
    ) -> Self {
        Self {
            params,
            media_box,
            resources,
            font_cache,
            ctm: MATRIX_IDENTITY,
            text: TextState::new(),
            graphics: GraphicState::default(),
            gstack: SmallVec::new(),
            in_text_object: false,
            object_marks: Vec::new(),
            marks: Vec::new(),
            form_memo: FxHashMap::default(),
            form_depth: 0,
            num_chars: 0,
            num_misses: 0,
            errors: Vec::new(),
        }
    }

    /// Runs the machine over a parsed content stream.
    ///
    /// Per-operator failures are logged, recorded, and skipped; the machine
    /// state is consistent after every operator.
    pub fn process(&mut self, ops: &[ContentOp]) {
        for op in ops {
            if let Err(err) = self.dispatch(op) {
                log::warn!("operator `{}` failed: {}", op.name, err);
                self.errors.push(err);
            }
        }
    }

    /// Flushes pending marks and returns everything produced.
    pub fn finish(mut self) -> InterpreterOutput {
        if self.in_text_object {
            log::warn!("content stream ended inside a text object");
        }
        self.flush_marks();
        InterpreterOutput {
            marks: self.marks,
            num_chars: self.num_chars,
            num_misses: self.num_misses,
            errors: self.errors,
        }
    }

    fn flush_marks(&mut self) {
        self.marks.append(&mut self.object_marks);
    }

    fn dispatch(&mut self, op: &ContentOp) -> Result<()> {
        match op.name.as_str() {
            // Graphics state
            "q" => self.do_q(),
            "Q" => self.do_Q(),
            "cm" => {
                let v = op.nums(6)?;
                self.do_cm((v[0], v[1], v[2], v[3], v[4], v[5]));
            }
            "gs" => log::debug!("ignoring ExtGState `{:?}`", op.operands.first()),

            // Text object
            "BT" => self.do_BT(),
            "ET" => self.do_ET(),

            // Text state
            "Tc" => self.text.char_spacing = op.num(0)?,
            "Tw" => self.text.word_spacing = op.num(0)?,
            "Tz" => self.text.scaling = op.num(0)?,
            "TL" => self.text.leading = op.num(0)?,
            "Tf" => {
                let name = op.name_arg(0)?.to_string();
                let size = op.num(1)?;
                self.do_Tf(&name, size)?;
            }
            "Tr" => self.text.render = op.int(0)? as i32,
            "Ts" => self.text.rise = op.num(0)?,

            // Text positioning
            "Td" => {
                let v = op.nums(2)?;
                self.do_Td(v[0], v[1]);
            }
            "TD" => {
                let v = op.nums(2)?;
                self.text.leading = -v[1];
                self.do_Td(v[0], v[1]);
            }
            "Tm" => {
                let v = op.nums(6)?;
                self.text.tm = (v[0], v[1], v[2], v[3], v[4], v[5]);
                self.text.tlm = self.text.tm;
            }
            "T*" => self.do_T_star(),

            // Text showing
            "Tj" => self.render_text(op.string(0)?)?,
            "TJ" => self.do_TJ(op.array(0)?)?,
            "'" => {
                self.do_T_star();
                self.render_text(op.string(0)?)?;
            }
            "\"" => {
                self.text.word_spacing = op.num(0)?;
                self.text.char_spacing = op.num(1)?;
                self.do_T_star();
                self.render_text(op.string(2)?)?;
            }

            // Color
            "G" => self.graphics.stroke_color = Color::Gray(op.num(0)?),
            "g" => self.graphics.fill_color = Color::Gray(op.num(0)?),
            "RG" => {
                let v = op.nums(3)?;
                self.graphics.stroke_color = Color::Rgb(v[0], v[1], v[2]);
            }
            "rg" => {
                let v = op.nums(3)?;
                self.graphics.fill_color = Color::Rgb(v[0], v[1], v[2]);
            }
            "K" => {
                let v = op.nums(4)?;
                self.graphics.stroke_color = Color::Cmyk(v[0], v[1], v[2], v[3]);
            }
            "k" => {
                let v = op.nums(4)?;
                self.graphics.fill_color = Color::Cmyk(v[0], v[1], v[2], v[3]);
            }
            "SC" | "SCN" => {
                if let Some(color) = Self::component_color(&op.operands) {
                    self.graphics.stroke_color = color;
                }
            }
            "sc" | "scn" => {
                if let Some(color) = Self::component_color(&op.operands) {
                    self.graphics.fill_color = color;
                }
            }
            "cs" | "CS" => log::debug!("ignoring colorspace selection `{:?}`", op.operands.first()),

            // XObjects
            "Do" => {
                let name = op.name_arg(0)?.to_string();
                self.do_Do(&name)?;
            }

            // Path construction and painting produce no text; marked content
            // and compatibility sections carry no state the extractor needs.
            "m" | "l" | "c" | "v" | "y" | "h" | "re" | "S" | "s" | "f" | "F" | "f*" | "B"
            | "B*" | "b" | "b*" | "n" | "W" | "W*" | "sh" | "d0" | "d1" | "BI" | "ID" | "EI"
            | "BMC" | "BDC" | "EMC" | "MP" | "DP" | "BX" | "EX" | "w" | "J" | "j" | "M" | "d"
            | "ri" | "i" => {}

            other => log::warn!("unknown operator `{}` skipped", other),
        }
        Ok(())
    }

    fn component_color(operands: &[Operand]) -> Option<Color> {
        let values: Vec<f64> = operands.iter().filter_map(|o| o.as_num().ok()).collect();
        Color::from_components(&values)
    }

    // ========================================================================
    // Graphics state operators
    // ========================================================================

    /// q - Save graphics state.
    #[allow(non_snake_case)]
    fn do_q(&mut self) {
        self.gstack
            .push((self.ctm, self.text.clone(), self.graphics.clone()));
    }

    /// Q - Restore graphics state; ignored when the stack is empty.
    #[allow(non_snake_case)]
    fn do_Q(&mut self) {
        if let Some((ctm, text, graphics)) = self.gstack.pop() {
            self.ctm = ctm;
            self.text = text;
            self.graphics = graphics;
        }
    }

    /// cm - Concatenate to the current transformation matrix.
    fn do_cm(&mut self, m: Matrix) {
        self.ctm = mult_matrix(m, self.ctm);
    }

    // ========================================================================
    // Text object operators
    // ========================================================================

    /// BT - Begin text object. A dangling prior BT is flushed with a
    /// warning.
    #[allow(non_snake_case)]
    fn do_BT(&mut self) {
        if self.in_text_object {
            log::warn!("BT inside an open text object; flushing previous object");
            self.flush_marks();
        }
        self.in_text_object = true;
        self.text.begin_text();
    }

    /// ET - End text object: flush its marks into the page list.
    #[allow(non_snake_case)]
    fn do_ET(&mut self) {
        if !self.in_text_object {
            log::debug!("ET without BT");
        }
        self.flush_marks();
        self.in_text_object = false;
        self.text.end_text();
    }

    // ========================================================================
    // Text positioning operators
    // ========================================================================

    /// Td - Move to the start of the next line, offset from the current
    /// line start.
    #[allow(non_snake_case)]
    fn do_Td(&mut self, tx: f64, ty: f64) {
        self.text.tlm = translate_matrix(self.text.tlm, (tx, ty));
        self.text.tm = self.text.tlm;
    }

    /// T* - Move to the start of the next line using the current leading.
    fn do_T_star(&mut self) {
        let leading = self.text.leading;
        self.do_Td(0.0, -leading);
    }

    /// Tf - Select font and size. A name missing from the resources falls
    /// back to the built-in font and suppresses rendering for the rest of
    /// the text object.
    #[allow(non_snake_case)]
    fn do_Tf(&mut self, name: &str, size: f64) -> Result<()> {
        self.text.font_name = Some(name.to_string());
        self.text.fontsize = size;

        if let Some(cache) = self.font_cache.as_deref_mut() {
            if let Some(font) = cache.get(name) {
                self.text.font = Some(font);
                return Ok(());
            }
        }
        match self.resources.get_font(name) {
            Some(font) => {
                if let Some(cache) = self.font_cache.as_deref_mut() {
                    cache.put(name, Arc::clone(&font));
                }
                self.text.font = Some(font);
                Ok(())
            }
            None => {
                self.text.font = Some(Arc::new(BuiltinFont::fallback()));
                self.text.invalid_font = true;
                Err(ExtractError::MissingFont(name.to_string()))
            }
        }
    }

    // ========================================================================
    // Text showing operators
    // ========================================================================

    /// TJ - Show text with per-element positioning adjustments.
    #[allow(non_snake_case)]
    fn do_TJ(&mut self, elements: &[Operand]) -> Result<()> {
        for element in elements {
            match element {
                Operand::Int(_) | Operand::Real(_) => {
                    let x = element.as_num()?;
                    let shift =
                        -x * 0.001 * self.text.fontsize * self.text.hscale();
                    self.text.tm = translate_matrix(self.text.tm, (shift, 0.0));
                }
                Operand::String(bytes) => self.render_text(bytes)?,
                other => {
                    return Err(ExtractError::Parse {
                        op: "TJ".to_string(),
                        msg: format!("unexpected element {:?}", other),
                    });
                }
            }
        }
        Ok(())
    }

    /// Renders one string operand: decode, place a mark per character,
    /// advance the text matrix.
    fn render_text(&mut self, bytes: &[u8]) -> Result<()> {
        if self.text.invalid_font {
            return Ok(());
        }
        let font = match self.text.font.clone() {
            Some(font) => font,
            None => {
                return Err(ExtractError::Parse {
                    op: "Tj".to_string(),
                    msg: "text shown before any Tf".to_string(),
                })
            }
        };

        let codes = font.bytes_to_charcodes(bytes);
        let (strings, num_chars, num_misses) = font.charcodes_to_strings(&codes);
        self.num_chars += num_chars;
        self.num_misses += num_misses;

        for (&code, decoded) in codes.iter().zip(strings) {
            let metrics =
                font.char_metrics(code)
                    .ok_or_else(|| ExtractError::MissingGlyphMetric {
                        font: font.name().to_string(),
                        code,
                    })?;
            self.place_mark(&font, code, decoded, metrics.wx);
        }
        Ok(())
    }

    /// Emits one mark and advances Tm by the glyph displacement.
    fn place_mark(&mut self, font: &Arc<dyn Font>, code: u32, decoded: String, wx: f64) {
        let fontsize = self.text.fontsize;
        let hscale = self.text.hscale();
        let word_spacing = if code == 32 { self.text.word_spacing } else { 0.0 };

        let param = (fontsize * hscale, 0.0, 0.0, fontsize, 0.0, self.text.rise);
        let trm = mult_matrix(param, mult_matrix(self.text.tm, self.ctm));

        let w0 = wx / 1000.0;
        let displacement = (w0 * fontsize + self.text.char_spacing + word_spacing) * hscale;
        let advance_to_end = (w0 * fontsize + word_spacing) * hscale;

        let start = matrix_translation(trm);
        let end = matrix_translation(translate_matrix(
            mult_matrix(self.text.tm, self.ctm),
            (advance_to_end, 0.0),
        ));

        let orientation = self.params.round_orientation(matrix_angle(trm));
        let height = if orientation % 180 == 90 {
            matrix_scale_x(trm)
        } else {
            matrix_scale_y(trm)
        };

        // Build the box in a frame where the baseline runs horizontally,
        // then rotate it back onto the page.
        let unrotate = rotation_matrix(-f64::from(orientation));
        let (sx, sy) = crate::utils::apply_matrix_pt(unrotate, start);
        let (ex, _) = crate::utils::apply_matrix_pt(unrotate, end);
        let level = (sx.min(ex), sy, sx.max(ex), sy + height);
        let bbox = rect_normalize(apply_matrix_rect(rotation_matrix(f64::from(orientation)), level));

        // Advance regardless of whether the mark survives clipping.
        self.text.tm = translate_matrix(self.text.tm, (displacement, 0.0));

        let Some(bbox) = rect_intersection(bbox, self.media_box) else {
            log::debug!("mark {:?} outside media box, dropped", decoded);
            return;
        };
        if bbox.0 >= bbox.2 - f64::EPSILON && bbox.1 >= bbox.3 - f64::EPSILON {
            log::warn!("degenerate mark box for {:?} at {:?}", decoded, bbox);
        }

        let mark = Mark::builder(bbox, &decoded, font.name(), matrix_scale_y(trm))
            .char_spacing(self.text.char_spacing)
            .orientation(orientation)
            .trm(trm)
            .fill_color(self.graphics.fill_color.clone())
            .stroke_color(self.graphics.stroke_color.clone())
            .build();
        self.object_marks.push(mark);
    }

    // ========================================================================
    // XObject operators
    // ========================================================================

    /// Do - Invoke a named XObject. Images are skipped; forms run
    /// recursively under the current CTM, memoized per (name, CTM).
    #[allow(non_snake_case)]
    fn do_Do(&mut self, name: &str) -> Result<()> {
        let form = match self.resources.get_form(name) {
            Some(form) => form,
            None => {
                return match self.resources.get_xobject(name) {
                    Some(XObjectKind::Image) => Ok(()),
                    Some(XObjectKind::Form) | None => Err(ExtractError::Parse {
                        op: "Do".to_string(),
                        msg: format!("unknown xobject `{}`", name),
                    }),
                };
            }
        };

        if self.form_depth >= MAX_FORM_DEPTH {
            return Err(ExtractError::FormOverflow);
        }

        let key: FormKey = (name.to_string(), ctm_bits(self.ctm));
        if let Some(cached) = self.form_memo.get(&key) {
            self.object_marks.extend(cached.marks.iter().cloned());
            self.num_chars += cached.num_chars;
            self.num_misses += cached.num_misses;
            return Ok(());
        }

        // Whatever is pending belongs to the outer stream.
        self.flush_marks();
        let marks_before = self.marks.len();
        let chars_before = self.num_chars;
        let misses_before = self.num_misses;

        let saved_gstack = std::mem::take(&mut self.gstack);
        let saved_text = std::mem::replace(&mut self.text, TextState::new());
        let saved_graphics = self.graphics.clone();
        let saved_resources = Arc::clone(&self.resources);
        let saved_in_text = self.in_text_object;
        self.in_text_object = false;
        if let Some(resources) = form.resources.clone() {
            self.resources = resources;
        }

        self.form_depth += 1;
        self.process(&form.ops);
        self.form_depth -= 1;
        self.flush_marks();

        self.gstack = saved_gstack;
        self.text = saved_text;
        self.graphics = saved_graphics;
        self.resources = saved_resources;
        self.in_text_object = saved_in_text;

        let result = FormResult {
            marks: self.marks[marks_before..].to_vec(),
            num_chars: self.num_chars - chars_before,
            num_misses: self.num_misses - misses_before,
        };
        self.form_memo.insert(key, result);
        Ok(())
    }
}
