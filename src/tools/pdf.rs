//! PDF editing tools backed by `lopdf`, plus encryption through `qpdf`.

use super::external::ExternalProgram;
use super::result::{ToolError, ToolResult};
use super::schema::{ParamType, ToolDescriptor, ToolSchema};
use super::staging::StagedFile;
use super::validate::{self, Expect, PDF};
use super::{blocking, TypedTool};
use async_trait::async_trait;
use image::DynamicImage;
use lopdf::{Dictionary, Document, Object, ObjectId, Stream};
use serde::Deserialize;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Page attributes a page may inherit from its ancestors in the page tree.
const INHERITABLE: [&[u8]; 4] = [b"Resources", b"MediaBox", b"CropBox", b"Rotate"];

/// Guard against cyclic `Parent` chains in malformed files.
const MAX_TREE_DEPTH: usize = 64;

/// Resource name of the watermark image on every page.
const WATERMARK_NAME: &str = "FwWatermark";

/// Arguments of [`MergePdfTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MergePdfArgs {
    pub input_files: Vec<String>,
    pub output_file: String,
}

/// Concatenates PDFs in argument order.
#[derive(Debug, Default)]
pub struct MergePdfTool;

#[async_trait]
impl TypedTool for MergePdfTool {
    type Args = MergePdfArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "merge_pdf_tool",
            "A tool for merging multiple PDF files into one document. \
             Provide an array of file paths for the PDFs to be merged and specify \
             the output file path for the merged PDF.",
            ToolSchema::new()
                .required_array(
                    "input_files",
                    ParamType::String,
                    "An array of file paths to the PDF files to be merged.",
                )
                .required(
                    "output_file",
                    ParamType::String,
                    "The file path for the resulting merged PDF.",
                ),
        )
    }

    async fn run(&self, args: MergePdfArgs) -> ToolResult {
        if args.input_files.is_empty() {
            return Err(ToolError::InvalidArgument(
                "At least one PDF file is required to merge.".to_string(),
            ));
        }

        let inputs = args
            .input_files
            .iter()
            .map(|raw| validate::input_pdf("File", raw))
            .collect::<Result<Vec<_>, _>>()?;
        let output = output_file(&args.output_file)?;

        let pages = blocking("merging PDFs", move || merge(&inputs, &output)).await?;

        info!("Merged {} files ({} pages) into {}", args.input_files.len(), pages, args.output_file);
        Ok(format!(
            "Merged PDF successfully created at '{}'.",
            args.output_file
        ))
    }
}

/// Arguments of [`SplitPdfTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SplitPdfArgs {
    pub file_path: String,
    pub output_dir: String,
}

/// Writes every page of a PDF to its own `page_<n>.pdf`.
///
/// Pages are written one at a time, so a failure part way through leaves
/// the pages already written in place.
#[derive(Debug, Default)]
pub struct SplitPdfTool;

#[async_trait]
impl TypedTool for SplitPdfTool {
    type Args = SplitPdfArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "split_pdf_tool",
            "A tool for splitting a PDF file into individual page PDFs. \
             Provide the file path of the PDF to split and an output directory \
             where the resulting PDF pages will be saved.",
            ToolSchema::new()
                .required(
                    "file_path",
                    ParamType::String,
                    "The file path of the PDF to be split.",
                )
                .required(
                    "output_dir",
                    ParamType::String,
                    "The directory where the split PDF files will be saved.",
                ),
        )
    }

    async fn run(&self, args: SplitPdfArgs) -> ToolResult {
        let input = validate::input_pdf("File", &args.file_path)?;
        let output_dir = validate::check("Output directory", &args.output_dir, &[Expect::Directory])?;
        validate::ensure_dir(&output_dir)?;

        let pages = blocking("splitting PDF", move || split(&input, &output_dir)).await?;

        info!("Split {} into {} pages", args.file_path, pages);
        Ok(format!(
            "Successfully split '{}' into {} pages, saved in '{}'.",
            args.file_path, pages, args.output_dir
        ))
    }
}

/// Arguments of [`RotatePdfTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RotatePdfArgs {
    pub file_path: String,
    pub output_file: String,
    pub page_numbers: Vec<i64>,
    pub angle: i64,
}

/// Rotates selected pages by a multiple of 90 degrees.
#[derive(Debug, Default)]
pub struct RotatePdfTool;

#[async_trait]
impl TypedTool for RotatePdfTool {
    type Args = RotatePdfArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "rotate_pdf_tool",
            "A tool for rotating specified pages in a PDF file by a given angle. \
             Provide the PDF file path, a list of page numbers (1-indexed) to rotate, \
             the rotation angle in degrees (must be a multiple of 90), and the output file path.",
            ToolSchema::new()
                .required(
                    "file_path",
                    ParamType::String,
                    "The file path of the PDF to be rotated.",
                )
                .required(
                    "output_file",
                    ParamType::String,
                    "The file path for the rotated PDF output.",
                )
                .required_array(
                    "page_numbers",
                    ParamType::Integer,
                    "An array of page numbers (1-indexed) to rotate. All other pages remain unchanged.",
                )
                .required(
                    "angle",
                    ParamType::Integer,
                    "The angle in degrees to rotate the specified pages (must be a multiple of 90).",
                ),
        )
    }

    async fn run(&self, args: RotatePdfArgs) -> ToolResult {
        if args.angle % 90 != 0 {
            return Err(ToolError::InvalidArgument(
                "Angle must be a multiple of 90 degrees.".to_string(),
            ));
        }
        let input = validate::input_pdf("File", &args.file_path)?;
        let output = output_file(&args.output_file)?;

        let pages = args.page_numbers.clone();
        let angle = args.angle;
        let rotated =
            blocking("rotating PDF", move || rotate(&input, &output, &pages, angle)).await?;
        debug!("Rotated {} pages", rotated);

        Ok(format!(
            "Successfully rotated pages {:?} in '{}' by {} degrees. Output saved at '{}'.",
            args.page_numbers, args.file_path, args.angle, args.output_file
        ))
    }
}

/// Arguments of [`WatermarkPdfTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct WatermarkPdfArgs {
    pub file_path: String,
    pub watermark_image: String,
    pub output_file: String,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

/// Where the watermark is drawn, in PDF points.
#[derive(Debug, Clone, Copy)]
struct Placement {
    x: f64,
    y: f64,
    width: f64,
    height: f64,
}

/// Stamps an image on every page.
#[derive(Debug, Default)]
pub struct WatermarkPdfTool;

#[async_trait]
impl TypedTool for WatermarkPdfTool {
    type Args = WatermarkPdfArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "watermark_pdf_tool",
            "A tool for adding an image watermark to each page of a PDF file. \
             Provide the PDF file path, the image file to be used as the watermark, \
             and the placement parameters (x, y, width, and height in points). \
             The watermark image will be placed over each PDF page at the specified location.",
            ToolSchema::new()
                .required(
                    "file_path",
                    ParamType::String,
                    "The file path of the PDF to which the watermark will be added.",
                )
                .required(
                    "watermark_image",
                    ParamType::String,
                    "The file path of the image to be used as a watermark.",
                )
                .required(
                    "output_file",
                    ParamType::String,
                    "The file path for the watermarked PDF output.",
                )
                .required(
                    "x",
                    ParamType::Number,
                    "The x-coordinate (in points) for the placement of the watermark on each PDF page.",
                )
                .required(
                    "y",
                    ParamType::Number,
                    "The y-coordinate (in points) for the placement of the watermark on each PDF page.",
                )
                .required(
                    "width",
                    ParamType::Number,
                    "The width (in points) of the watermark image.",
                )
                .required(
                    "height",
                    ParamType::Number,
                    "The height (in points) of the watermark image.",
                ),
        )
    }

    async fn run(&self, args: WatermarkPdfArgs) -> ToolResult {
        let input = validate::check("PDF file", &args.file_path, &[Expect::Exists, Expect::File])?;
        let image = validate::input_file("Watermark image", &args.watermark_image)?;
        validate::check("File", &args.file_path, &[Expect::Extension(PDF)])?;

        if !(args.width > 0.0 && args.height > 0.0) {
            return Err(ToolError::InvalidArgument(format!(
                "Watermark width and height must be positive, got {}x{}.",
                args.width, args.height
            )));
        }
        let output = output_file(&args.output_file)?;

        let placement = Placement {
            x: args.x,
            y: args.y,
            width: args.width,
            height: args.height,
        };
        blocking("applying image watermark", move || {
            watermark(&input, &image, &output, placement)
        })
        .await?;

        info!("Watermarked {} with {}", args.file_path, args.watermark_image);
        Ok(format!(
            "Successfully added watermark image '{}' to '{}'. Output saved at '{}'.",
            args.watermark_image, args.file_path, args.output_file
        ))
    }
}

/// Arguments of [`AddPasswordTool`].
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AddPasswordArgs {
    pub file_path: String,
    pub password: String,
    pub output_file: String,
}

/// Encrypts a PDF with a user password (AES-256) using `qpdf`.
#[derive(Debug, Clone)]
pub struct AddPasswordTool {
    qpdf: ExternalProgram,
}

impl AddPasswordTool {
    pub fn new(qpdf: &str) -> Self {
        Self {
            // qpdf exits with 3 when it succeeded with warnings.
            qpdf: ExternalProgram::new(qpdf, "to add password protection to PDF files")
                .with_success_codes(&[0, 3]),
        }
    }
}

impl Default for AddPasswordTool {
    fn default() -> Self {
        Self::new("qpdf")
    }
}

#[async_trait]
impl TypedTool for AddPasswordTool {
    type Args = AddPasswordArgs;

    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(
            "add_password_to_pdf_tool",
            "A tool for adding password protection to a PDF file. \
             Provide the file path of the PDF to secure, the password to set, \
             and the output file path for the encrypted PDF. The resulting PDF will require \
             the provided password to be opened.",
            ToolSchema::new()
                .required(
                    "file_path",
                    ParamType::String,
                    "The file path of the PDF to be password-protected.",
                )
                .required(
                    "password",
                    ParamType::String,
                    "The password to apply to the PDF. Users will need this password to open the file.",
                )
                .required(
                    "output_file",
                    ParamType::String,
                    "The file path for the output, password-protected PDF.",
                ),
        )
    }

    async fn run(&self, args: AddPasswordArgs) -> ToolResult {
        let input = validate::check("PDF file", &args.file_path, &[Expect::Exists, Expect::File])?;
        validate::check("File", &args.file_path, &[Expect::Extension(PDF)])?;

        if args.password.is_empty() {
            return Err(ToolError::InvalidArgument(
                "The password must not be empty.".to_string(),
            ));
        }
        if args.password.contains(['\n', '\r']) {
            return Err(ToolError::InvalidArgument(
                "The password must not contain line breaks.".to_string(),
            ));
        }
        let output = output_file(&args.output_file)?;

        // The password goes through an argument file so it never shows up
        // in the process list or in logged command lines.
        let mut arg_file = tempfile::NamedTempFile::new()
            .map_err(|e| ToolError::io("creating a qpdf argument file", &e))?;
        writeln!(
            arg_file,
            "--encrypt\n{pw}\n{pw}\n256\n--",
            pw = args.password
        )
        .map_err(|e| ToolError::io("writing a qpdf argument file", &e))?;

        let staged = StagedFile::new(&output)?;
        let mut arg_ref = std::ffi::OsString::from("@");
        arg_ref.push(arg_file.path());

        self.qpdf
            .run([
                arg_ref.as_os_str(),
                input.as_os_str(),
                staged.path().as_os_str(),
            ])
            .await?;
        staged.commit()?;

        info!("Encrypted {} into {}", args.file_path, args.output_file);
        Ok(format!(
            "Successfully added password protection to '{}'. Encrypted PDF saved at '{}'.",
            args.file_path, args.output_file
        ))
    }
}

/// Validate an output PDF location and create its directory.
fn output_file(raw: &str) -> Result<PathBuf, ToolError> {
    let path = validate::check("Output file", raw, &[Expect::Vacant { force_overwrite: true }])?;
    validate::ensure_parent_dir(&path)?;
    Ok(path)
}

fn load(path: &Path) -> Result<Document, ToolError> {
    Document::load(path)
        .map_err(|e| ToolError::Generic(format!("Error reading PDF '{}': {}", path.display(), e)))
}

fn save(doc: &mut Document, target: &Path) -> Result<PathBuf, ToolError> {
    let write_error =
        |e: String| ToolError::Generic(format!("Error writing '{}': {}", target.display(), e));

    let mut staged = StagedFile::new(target)?;
    {
        let mut writer = BufWriter::new(staged.file_mut());
        doc.save_to(&mut writer).map_err(|e| write_error(e.to_string()))?;
        writer.flush().map_err(|e| write_error(e.to_string()))?;
    }
    staged.commit()
}

/// `/Type` name of a dictionary or stream object.
fn type_name(object: &Object) -> Option<&[u8]> {
    let dict = match object {
        Object::Dictionary(dict) => dict,
        Object::Stream(stream) => &stream.dict,
        _ => return None,
    };
    match dict.get(b"Type") {
        Ok(Object::Name(name)) => Some(name.as_slice()),
        _ => None,
    }
}

/// Follow a reference one level.
fn resolve<'a>(doc: &'a Document, object: &'a Object) -> &'a Object {
    match object {
        Object::Reference(id) => doc.get_object(*id).unwrap_or(object),
        _ => object,
    }
}

/// Look up `key` on a page, walking up the page tree if necessary.
fn inherited(doc: &Document, page_id: ObjectId, key: &[u8]) -> Option<Object> {
    let mut current = page_id;
    for _ in 0..MAX_TREE_DEPTH {
        let node = doc.get_dictionary(current).ok()?;
        if let Ok(value) = node.get(key) {
            return Some(value.clone());
        }
        current = match node.get(b"Parent") {
            Ok(Object::Reference(id)) => *id,
            _ => return None,
        };
    }
    None
}

fn merge(inputs: &[PathBuf], output: &Path) -> Result<usize, ToolError> {
    let mut merged = Document::with_version("1.5");
    let pages_id = merged.new_object_id();
    let mut kids = Vec::new();

    for input in inputs {
        let mut doc = load(input)?;
        doc.renumber_objects_with(merged.max_id + 1);

        for page_id in doc.get_pages().into_values() {
            // The source page tree is dropped, so copy down anything the
            // page inherited from it.
            let copied: Vec<(&[u8], Object)> = INHERITABLE
                .iter()
                .filter(|key| {
                    doc.get_dictionary(page_id)
                        .map(|page| !page.has(key))
                        .unwrap_or(false)
                })
                .filter_map(|key| inherited(&doc, page_id, key).map(|value| (*key, value)))
                .collect();

            let page = doc.get_dictionary_mut(page_id).map_err(|e| {
                ToolError::Generic(format!("Error reading PDF '{}': {}", input.display(), e))
            })?;
            for (key, value) in copied {
                page.set(key, value);
            }
            page.set("Parent", Object::Reference(pages_id));
            kids.push(Object::Reference(page_id));
        }

        if let Some(max) = doc.objects.keys().map(|(id, _)| *id).max() {
            merged.max_id = merged.max_id.max(max);
        }
        for (id, object) in doc.objects {
            if matches!(
                type_name(&object),
                Some(b"Catalog" | b"Pages" | b"Outlines" | b"Outline")
            ) {
                continue;
            }
            merged.objects.insert(id, object);
        }
    }

    let page_count = kids.len();
    let mut tree = Dictionary::new();
    tree.set("Type", Object::Name(b"Pages".to_vec()));
    tree.set("Kids", Object::Array(kids));
    tree.set("Count", Object::Integer(page_count as i64));
    merged.objects.insert(pages_id, Object::Dictionary(tree));

    let mut catalog = Dictionary::new();
    catalog.set("Type", Object::Name(b"Catalog".to_vec()));
    catalog.set("Pages", Object::Reference(pages_id));
    let catalog_id = merged.add_object(Object::Dictionary(catalog));
    merged.trailer.set("Root", Object::Reference(catalog_id));

    save(&mut merged, output)?;
    Ok(page_count)
}

fn split(input: &Path, output_dir: &Path) -> Result<usize, ToolError> {
    let doc = load(input)?;
    let numbers: Vec<u32> = doc.get_pages().keys().copied().collect();

    for &number in &numbers {
        let mut single = doc.clone();
        let others: Vec<u32> = numbers.iter().copied().filter(|&n| n != number).collect();
        single.delete_pages(&others);
        single.prune_objects();
        save(&mut single, &output_dir.join(format!("page_{}.pdf", number)))?;
    }

    Ok(numbers.len())
}

fn rotate(input: &Path, output: &Path, pages: &[i64], angle: i64) -> Result<usize, ToolError> {
    let mut doc = load(input)?;
    let mut rotated = 0;

    for (number, page_id) in doc.get_pages() {
        if !pages.contains(&i64::from(number)) {
            continue;
        }
        let current = match inherited(&doc, page_id, b"Rotate") {
            Some(value) => match resolve(&doc, &value) {
                Object::Integer(r) => *r,
                _ => 0,
            },
            None => 0,
        };

        let page = doc.get_dictionary_mut(page_id).map_err(|e| {
            ToolError::Generic(format!("Error reading PDF '{}': {}", input.display(), e))
        })?;
        page.set("Rotate", Object::Integer((current + angle).rem_euclid(360)));
        rotated += 1;
    }

    save(&mut doc, output)?;
    Ok(rotated)
}

fn watermark(input: &Path, image_path: &Path, output: &Path, at: Placement) -> Result<(), ToolError> {
    let image = image::open(image_path).map_err(|e| {
        ToolError::UnsupportedFormat(format!(
            "Cannot read watermark image '{}': {}",
            image_path.display(),
            e
        ))
    })?;
    let mut doc = load(input)?;

    let image_id = embed_image(&mut doc, &image);
    let open_id = doc.add_object(Stream::new(Dictionary::new(), b"q\n".to_vec()));
    let draw = format!(
        "\nQ q {} 0 0 {} {} {} cm /{} Do Q\n",
        at.width, at.height, at.x, at.y, WATERMARK_NAME
    );
    let draw_id = doc.add_object(Stream::new(Dictionary::new(), draw.into_bytes()));

    for page_id in doc.get_pages().into_values() {
        let resources = page_resources(&doc, page_id, image_id);
        let existing = match doc.get_dictionary(page_id).and_then(|page| page.get(b"Contents")) {
            Ok(Object::Array(items)) => items.clone(),
            Ok(other) => vec![other.clone()],
            Err(_) => Vec::new(),
        };

        // Wrap the original content in q/Q so its graphics state cannot
        // leak into the watermark.
        let mut contents = Vec::with_capacity(existing.len() + 2);
        contents.push(Object::Reference(open_id));
        contents.extend(existing);
        contents.push(Object::Reference(draw_id));

        let page = doc.get_dictionary_mut(page_id).map_err(|e| {
            ToolError::Generic(format!("Error reading PDF '{}': {}", input.display(), e))
        })?;
        page.set("Resources", Object::Dictionary(resources));
        page.set("Contents", Object::Array(contents));
    }

    doc.compress();
    save(&mut doc, output)?;
    Ok(())
}

/// The page's effective resources with the watermark added as an XObject.
fn page_resources(doc: &Document, page_id: ObjectId, image_id: ObjectId) -> Dictionary {
    let mut resources = inherited(doc, page_id, b"Resources")
        .and_then(|value| match resolve(doc, &value) {
            Object::Dictionary(dict) => Some(dict.clone()),
            _ => None,
        })
        .unwrap_or_else(Dictionary::new);

    let mut xobjects = match resources.get(b"XObject") {
        Ok(value) => match resolve(doc, value) {
            Object::Dictionary(dict) => dict.clone(),
            _ => Dictionary::new(),
        },
        Err(_) => Dictionary::new(),
    };
    xobjects.set(WATERMARK_NAME, Object::Reference(image_id));
    resources.set("XObject", Object::Dictionary(xobjects));
    resources
}

fn image_dict(width: u32, height: u32, color_space: &[u8]) -> Dictionary {
    let mut dict = Dictionary::new();
    dict.set("Type", Object::Name(b"XObject".to_vec()));
    dict.set("Subtype", Object::Name(b"Image".to_vec()));
    dict.set("Width", Object::Integer(i64::from(width)));
    dict.set("Height", Object::Integer(i64::from(height)));
    dict.set("ColorSpace", Object::Name(color_space.to_vec()));
    dict.set("BitsPerComponent", Object::Integer(8));
    dict
}

/// Add `image` as an RGB image XObject, with its alpha channel as a soft mask.
fn embed_image(doc: &mut Document, image: &DynamicImage) -> ObjectId {
    let (width, height) = (image.width(), image.height());
    let mut dict = image_dict(width, height, b"DeviceRGB");

    if image.color().has_alpha() {
        let alpha: Vec<u8> = image.to_rgba8().pixels().map(|p| p.0[3]).collect();
        let mask_id = doc.add_object(Stream::new(image_dict(width, height, b"DeviceGray"), alpha));
        dict.set("SMask", Object::Reference(mask_id));
    }

    doc.add_object(Stream::new(dict, image.to_rgb8().into_raw()))
}
