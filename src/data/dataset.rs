//! Datasets: shaped, typed arrays with lazily loaded metadata and cached values.

use super::text::{byte_to_string, string_to_byte};
use super::unsigned::{convert_from_unsigned, narrow_to_storage};
use super::{DataBuffer, ObjectId};
use crate::backend::{Backend, Handle, HandleGuard};
use crate::datatype::{flatten, import_type, CompoundMembers, DatatypeArena, DatatypeClass, TypeId};
use crate::error::{ObjectError, Result};
use crate::selection::Selection;
use crate::util::ObjectConfig;

/// Progress of the one-time metadata load.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum InitState {
    /// Metadata has not been loaded.
    #[default]
    Uninitialized,
    /// Metadata is loaded.
    Initialized,
    /// Loading failed; holds the reason.
    Failed(String),
}

/// Pixel layout of true-colour images.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Interlace {
    /// Components of one pixel are adjacent.
    #[default]
    Pixel,
    /// Each component is a separate plane.
    Plane,
    /// Components are interleaved per line.
    Line,
}

/// Extra state of datasets with atomic element types.
#[derive(Debug, Clone, Default)]
pub struct ScalarInfo {
    /// Values are text.
    pub is_text: bool,
    /// Values form an image.
    pub is_image: bool,
    /// Image is true colour rather than indexed.
    pub is_true_color: bool,
    /// Pixel layout of a true-colour image.
    pub interlace: Interlace,
    /// Palette of an indexed image.
    pub palette: Option<Vec<[u8; 3]>>,
    image_data_range: Option<(f64, f64)>,
    filtered_image_values: Vec<f64>,
    fill_value: Option<DataBuffer>,
    fill_value_converted: bool,
}

impl ScalarInfo {
    /// Set the value range used to scale image data; ignored when `max <= min`.
    pub fn set_image_data_range(&mut self, min: f64, max: f64) {
        if max <= min {
            tracing::debug!("set_image_data_range: ignoring empty range {}..{}", min, max);
            return;
        }
        self.image_data_range = Some((min, max));
    }

    /// Value range used to scale image data.
    pub fn image_data_range(&self) -> Option<(f64, f64)> {
        self.image_data_range
    }

    /// Add a value to leave out of image scaling; duplicates are ignored.
    pub fn add_filtered_image_value(&mut self, value: f64) {
        if !self.filtered_image_values.contains(&value) {
            self.filtered_image_values.push(value);
        }
    }

    /// Values left out of image scaling.
    pub fn filtered_image_values(&self) -> &[f64] {
        &self.filtered_image_values
    }

    /// Set the fill value in storage representation.
    pub fn set_fill_value(&mut self, value: impl Into<DataBuffer>) {
        self.fill_value = Some(value.into());
        self.fill_value_converted = false;
    }

    /// Fill value; widened alongside the data of unsigned datasets.
    pub fn fill_value(&self) -> Option<&DataBuffer> {
        self.fill_value.as_ref()
    }
}

/// Element layout of a dataset.
#[derive(Debug, Clone)]
pub enum DatasetKind {
    /// Atomic elements.
    Scalar(ScalarInfo),
    /// Compound elements, flattened into members.
    Compound(CompoundMembers),
}

/// A dataset's metadata, selection and cached values.
///
/// Nothing is known about the dataset until its entity is initialized.
/// Values are read once and cached until [`Dataset::clear_data`].
#[derive(Debug, Clone)]
pub struct Dataset {
    label: String,
    state: InitState,
    config: ObjectConfig,
    arena: DatatypeArena,
    datatype: Option<TypeId>,
    dims: Vec<usize>,
    max_dims: Vec<usize>,
    dim_names: Option<Vec<String>>,
    selection: Selection,
    data: Option<DataBuffer>,
    original: Option<DataBuffer>,
    unsigned_converted: bool,
    kind: DatasetKind,
}

impl Dataset {
    /// A dataset of the given kind with explicit configuration.
    pub fn with_config(kind: DatasetKind, config: ObjectConfig) -> Self {
        Self {
            label: "dataset".to_string(),
            state: InitState::Uninitialized,
            config,
            arena: DatatypeArena::new(),
            datatype: None,
            dims: Vec::new(),
            max_dims: Vec::new(),
            dim_names: None,
            selection: Selection::default(),
            data: None,
            original: None,
            unsigned_converted: false,
            kind,
        }
    }

    /// A dataset with atomic elements.
    pub fn scalar() -> Self {
        Self::with_config(DatasetKind::Scalar(ScalarInfo::default()), ObjectConfig::default())
    }

    /// A dataset with compound elements.
    pub fn compound() -> Self {
        Self::with_config(DatasetKind::Compound(CompoundMembers::default()), ObjectConfig::default())
    }

    /// An uninitialized dataset of the same kind and configuration.
    pub fn fresh(&self) -> Self {
        let kind = match &self.kind {
            DatasetKind::Scalar(_) => DatasetKind::Scalar(ScalarInfo::default()),
            DatasetKind::Compound(_) => DatasetKind::Compound(CompoundMembers::default()),
        };
        Self::with_config(kind, self.config.clone())
    }

    /// Element layout.
    pub fn kind(&self) -> &DatasetKind {
        &self.kind
    }

    /// Check if elements are compound.
    pub fn is_compound(&self) -> bool {
        matches!(self.kind, DatasetKind::Compound(_))
    }

    /// Load state.
    pub fn state(&self) -> &InitState {
        &self.state
    }

    /// Check if metadata is loaded.
    pub fn is_initialized(&self) -> bool {
        self.state == InitState::Initialized
    }

    /// Configuration.
    pub fn config(&self) -> &ObjectConfig {
        &self.config
    }

    /// Mutable configuration.
    pub fn config_mut(&mut self) -> &mut ObjectConfig {
        &mut self.config
    }

    fn ensure_initialized(&self) -> Result<()> {
        match &self.state {
            InitState::Initialized => Ok(()),
            InitState::Uninitialized => Err(ObjectError::not_initialized(&self.label)),
            InitState::Failed(reason) => Err(ObjectError::InitFailed {
                name: self.label.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// Number of dimensions; scalars have rank 1.
    pub fn rank(&self) -> Result<usize> {
        self.ensure_initialized()?;
        Ok(self.dims.len())
    }

    /// Current dimensions.
    pub fn dims(&self) -> Result<&[usize]> {
        self.ensure_initialized()?;
        Ok(&self.dims)
    }

    /// Maximum dimensions; equal to `dims` unless the dataset is extendible.
    pub fn max_dims(&self) -> Result<&[usize]> {
        self.ensure_initialized()?;
        Ok(&self.max_dims)
    }

    /// Dimension names, if the backend reported any.
    pub fn dim_names(&self) -> Option<&[String]> {
        self.dim_names.as_deref()
    }

    /// Datatype arena and root type.
    pub fn datatype(&self) -> Result<(&DatatypeArena, TypeId)> {
        self.ensure_initialized()?;
        let root = self.datatype.ok_or_else(|| ObjectError::not_initialized(&self.label))?;
        Ok((&self.arena, root))
    }

    /// Check if elements are unsigned integers.
    pub fn is_unsigned(&self) -> bool {
        self.datatype.is_some_and(|id| self.arena.is_unsigned(id))
    }

    /// Current selection.
    pub fn selection(&self) -> Result<&Selection> {
        self.ensure_initialized()?;
        Ok(&self.selection)
    }

    /// Mutable selection. Changes apply to the next read after `clear_data`.
    pub fn selection_mut(&mut self) -> Result<&mut Selection> {
        self.ensure_initialized()?;
        Ok(&mut self.selection)
    }

    /// Rows of the current 2-D view.
    pub fn height(&self) -> Result<usize> {
        Ok(self.selection()?.height())
    }

    /// Columns of the current 2-D view.
    pub fn width(&self) -> Result<usize> {
        Ok(self.selection()?.width())
    }

    /// Flattened members of a compound dataset; empty until initialized.
    pub fn members(&self) -> Option<&CompoundMembers> {
        match &self.kind {
            DatasetKind::Compound(m) => Some(m),
            DatasetKind::Scalar(_) => None,
        }
    }

    /// Mutable flattened members.
    pub fn members_mut(&mut self) -> Option<&mut CompoundMembers> {
        match &mut self.kind {
            DatasetKind::Compound(m) => Some(m),
            DatasetKind::Scalar(_) => None,
        }
    }

    /// Scalar-dataset state.
    pub fn scalar_info(&self) -> Option<&ScalarInfo> {
        match &self.kind {
            DatasetKind::Scalar(info) => Some(info),
            DatasetKind::Compound(_) => None,
        }
    }

    /// Mutable scalar-dataset state.
    pub fn scalar_info_mut(&mut self) -> Option<&mut ScalarInfo> {
        match &mut self.kind {
            DatasetKind::Scalar(info) => Some(info),
            DatasetKind::Compound(_) => None,
        }
    }

    /// Cached values, if read.
    pub fn data(&self) -> Option<&DataBuffer> {
        self.data.as_ref()
    }

    /// Values as stored, before unsigned widening.
    pub fn original_data(&self) -> Option<&DataBuffer> {
        self.original.as_ref()
    }

    /// Check if the cached values have been widened from unsigned storage.
    pub fn is_unsigned_converted(&self) -> bool {
        self.unsigned_converted
    }

    /// Drop cached values so the next read goes to the backend.
    pub fn clear_data(&mut self) {
        self.data = None;
        self.unsigned_converted = false;
    }

    /// Drop every buffer held by the dataset.
    pub fn clear(&mut self) {
        self.clear_data();
        self.original = None;
    }

    /// Load metadata from the backend.
    ///
    /// After a successful load, calling again only restores the default
    /// selection and selects every member. If the object cannot be opened the
    /// dataset is left untouched; any later failure leaves it `Failed` with no
    /// members.
    pub(crate) fn init<B: Backend + ?Sized>(&mut self, backend: &mut B, full_name: &str) -> Result<()> {
        self.label = full_name.to_string();
        if self.state == InitState::Initialized {
            self.selection.reset(&self.dims);
            if let DatasetKind::Compound(members) = &mut self.kind {
                members.set_all_selected(true);
            }
            return Ok(());
        }

        let mut object = HandleGuard::open(backend, full_name)?;
        let handle = object.handle();
        match self.load(&mut *object, handle) {
            Ok(()) => {
                tracing::debug!("init {}: dims {:?}", full_name, self.dims);
                self.state = InitState::Initialized;
                Ok(())
            }
            Err(e) => {
                tracing::warn!("init {} failed: {}", full_name, e);
                if let DatasetKind::Compound(members) = &mut self.kind {
                    members.clear();
                }
                self.state = InitState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    fn load<B: Backend + ?Sized>(&mut self, backend: &mut B, object: Handle) -> Result<()> {
        let space = backend.dataspace(object)?;
        let type_handle = backend.datatype(object)?;
        let mut arena = DatatypeArena::new();
        let root = {
            let mut guard = HandleGuard::adopt(&mut *backend, type_handle);
            import_type(&mut *guard, type_handle, &mut arena)?
        };
        let class = arena.resolve(root)?.class;

        let dims = if space.dims.is_empty() { vec![1] } else { space.dims };
        match &mut self.kind {
            DatasetKind::Compound(members) => *members = flatten(&arena, root, self.config.member_separator),
            DatasetKind::Scalar(info) => info.is_text = class == DatatypeClass::String,
        }
        self.max_dims = space.max_dims.unwrap_or_else(|| dims.clone());
        self.dim_names = space.dim_names;
        self.selection.reset(&dims);
        self.dims = dims;
        self.arena = arena;
        self.datatype = Some(root);
        Ok(())
    }

    /// Read the selected values, loading metadata first if needed.
    ///
    /// Unsigned values are widened once; fixed-length strings become text
    /// when `convert_byte_to_string` is set.
    pub(crate) fn read<B: Backend + ?Sized>(&mut self, backend: &mut B, full_name: &str) -> Result<&DataBuffer> {
        if self.state == InitState::Uninitialized {
            self.init(backend, full_name)?;
        }
        self.ensure_initialized()?;
        if self.data.is_none() {
            let members = self.selected_member_names()?;
            let raw = {
                let mut object = HandleGuard::open(backend, full_name)?;
                let handle = object.handle();
                object.read(handle, &self.selection, &members)?
            };
            tracing::debug!("read {}: {} {} values", full_name, raw.len(), raw.kind_name());
            let data = self.convert_read(raw)?;
            self.data = Some(data);
        }
        self.data.as_ref().ok_or_else(|| ObjectError::not_initialized(full_name))
    }

    fn selected_member_names(&self) -> Result<Vec<String>> {
        match &self.kind {
            DatasetKind::Scalar(_) => Ok(Vec::new()),
            DatasetKind::Compound(members) => {
                let names: Vec<String> = members.selected_names().into_iter().map(str::to_string).collect();
                if names.is_empty() {
                    return Err(ObjectError::InvalidSelection("no compound member selected".to_string()));
                }
                Ok(names)
            }
        }
    }

    fn convert_read(&mut self, raw: DataBuffer) -> Result<DataBuffer> {
        let root = self.datatype.ok_or_else(|| ObjectError::not_initialized(&self.label))?;
        let (size, unsigned) = {
            let dt = self.arena.resolve(root)?;
            (dt.size, self.arena.is_unsigned(root))
        };
        match &mut self.kind {
            DatasetKind::Scalar(info) => {
                if info.is_text && self.config.convert_byte_to_string {
                    if let DataBuffer::Bytes(bytes) = &raw {
                        if size > 0 {
                            return Ok(DataBuffer::Text(
                                byte_to_string(bytes, size).into_iter().map(Some).collect(),
                            ));
                        }
                    }
                }
                if unsigned && !self.unsigned_converted {
                    let converted = convert_from_unsigned(&raw, None)?;
                    if !info.fill_value_converted {
                        if let Some(fill) = info.fill_value.take() {
                            info.fill_value = Some(convert_from_unsigned(&fill, None)?);
                        }
                        info.fill_value_converted = true;
                    }
                    self.original = Some(raw);
                    self.unsigned_converted = true;
                    return Ok(converted);
                }
                Ok(raw)
            }
            DatasetKind::Compound(members) => {
                let DataBuffer::Compound(columns) = raw else {
                    return Err(ObjectError::conversion(format!(
                        "expected member buffers, got {}",
                        raw.kind_name()
                    )));
                };
                let converted = columns
                    .into_iter()
                    .zip(members.selected_types())
                    .map(|(column, ty)| read_member(&self.arena, column, ty, self.config.convert_byte_to_string))
                    .collect::<Result<Vec<_>>>()?;
                Ok(DataBuffer::Compound(converted))
            }
        }
    }

    /// Write values into the current selection.
    ///
    /// Unsigned values wider than their storage are narrowed back; text is
    /// packed into fixed-length records.
    pub(crate) fn write<B: Backend + ?Sized>(&mut self, backend: &mut B, full_name: &str, data: &DataBuffer) -> Result<()> {
        if self.state == InitState::Uninitialized {
            self.init(backend, full_name)?;
        }
        self.ensure_initialized()?;
        let members = self.selected_member_names()?;
        let payload = match &self.kind {
            DatasetKind::Scalar(_) => {
                let root = self.datatype.ok_or_else(|| ObjectError::not_initialized(full_name))?;
                write_member(&self.arena, data, Some(root))?
            }
            DatasetKind::Compound(flat) => {
                let DataBuffer::Compound(columns) = data else {
                    return Err(ObjectError::conversion("compound datasets are written from member buffers"));
                };
                if columns.len() != members.len() {
                    return Err(ObjectError::InvalidSelection(format!(
                        "{} member buffers for {} selected members",
                        columns.len(),
                        members.len()
                    )));
                }
                let payload = columns
                    .iter()
                    .zip(flat.selected_types())
                    .map(|(column, ty)| write_member(&self.arena, column, ty))
                    .collect::<Result<Vec<_>>>()?;
                DataBuffer::Compound(payload)
            }
        };
        let mut object = HandleGuard::open(backend, full_name)?;
        let handle = object.handle();
        object.write(handle, &self.selection, &members, &payload)?;
        tracing::debug!("write {}: {} values", full_name, data.len());
        Ok(())
    }

    /// Copy the dataset to `destination`, optionally only the current selection.
    pub(crate) fn copy<B: Backend + ?Sized>(
        &mut self,
        backend: &mut B,
        full_name: &str,
        destination: &str,
        subset: bool,
    ) -> Result<ObjectId> {
        if subset && self.is_compound() {
            return Err(ObjectError::unsupported("compound dataset", "copy with subset"));
        }
        if subset {
            if self.state == InitState::Uninitialized {
                self.init(backend, full_name)?;
            }
            self.ensure_initialized()?;
        }
        let mut object = HandleGuard::open(backend, full_name)?;
        let handle = object.handle();
        object.copy(handle, destination, subset.then_some(&self.selection))
    }
}

fn read_member(arena: &DatatypeArena, column: DataBuffer, ty: Option<TypeId>, to_text: bool) -> Result<DataBuffer> {
    let Some((id, dt)) = ty.and_then(|id| arena.get(id).map(|dt| (id, dt))) else {
        return Ok(column);
    };
    match &column {
        DataBuffer::Bytes(bytes) if to_text && dt.class == DatatypeClass::String && dt.size > 0 => Ok(
            DataBuffer::Text(byte_to_string(bytes, dt.size).into_iter().map(Some).collect()),
        ),
        _ if arena.is_unsigned(id) => convert_from_unsigned(&column, None),
        _ => Ok(column),
    }
}

fn write_member(arena: &DatatypeArena, column: &DataBuffer, ty: Option<TypeId>) -> Result<DataBuffer> {
    let Some((id, dt)) = ty.and_then(|id| arena.get(id).map(|dt| (id, dt))) else {
        return Ok(column.clone());
    };
    match column {
        DataBuffer::Text(texts) if dt.class == DatatypeClass::String && dt.size > 0 => {
            Ok(DataBuffer::Bytes(string_to_byte(texts, dt.size)))
        }
        _ if arena.is_unsigned(id) => {
            let storage = arena.element(id).map_or(dt.size, |element| element.size);
            narrow_to_storage(column, storage)
        }
        _ => Ok(column.clone()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MemoryBackend;

    fn backend() -> MemoryBackend {
        let mut backend = MemoryBackend::new();
        backend
            .add_dataset("/u8", "u8", &[2, 2], vec![-1i8, 0, 1, -128])
            .unwrap();
        backend
            .add_dataset("/names", "string(4)", &[2], b"ab\0\0cd  ".to_vec())
            .unwrap();
        backend
    }

    #[test]
    fn test_accessors_before_init() {
        let ds = Dataset::scalar();
        assert!(matches!(ds.dims(), Err(ObjectError::NotInitialized { .. })));
        assert!(ds.selection().is_err());
        assert!(Dataset::compound().members().is_some_and(|m| m.member_count() == 0));
    }

    #[test]
    fn test_unsigned_read_is_widened_once() {
        let mut backend = backend();
        let mut ds = Dataset::scalar();
        let data = ds.read(&mut backend, "/u8").unwrap().clone();
        assert_eq!(data, DataBuffer::I16(vec![255, 0, 1, 128]));
        assert!(ds.is_unsigned_converted());
        assert_eq!(ds.original_data(), Some(&DataBuffer::I8(vec![-1, 0, 1, -128])));
        assert_eq!(ds.read(&mut backend, "/u8").unwrap(), &data);

        ds.clear_data();
        assert!(!ds.is_unsigned_converted());
        assert_eq!(ds.read(&mut backend, "/u8").unwrap(), &data);
        assert_eq!(backend.open_handle_count(), 0);
    }

    #[test]
    fn test_fill_value_widened_with_data() {
        let mut backend = backend();
        let mut ds = Dataset::scalar();
        ds.init(&mut backend, "/u8").unwrap();
        ds.scalar_info_mut().unwrap().set_fill_value(vec![-1i8]);
        ds.read(&mut backend, "/u8").unwrap();
        assert_eq!(ds.scalar_info().unwrap().fill_value(), Some(&DataBuffer::I16(vec![255])));
    }

    #[test]
    fn test_write_narrows_unsigned() {
        let mut backend = backend();
        let mut ds = Dataset::scalar();
        ds.init(&mut backend, "/u8").unwrap();
        {
            let selection = ds.selection_mut().unwrap();
            selection.count_mut()[0] = 1;
        }
        ds.write(&mut backend, "/u8", &DataBuffer::I16(vec![200, 300])).unwrap();
        assert_eq!(backend.values("/u8"), Some(&DataBuffer::I8(vec![-56, 44, 1, -128])));
    }

    #[test]
    fn test_fixed_strings_become_text() {
        let mut backend = backend();
        let mut ds = Dataset::scalar();
        let data = ds.read(&mut backend, "/names").unwrap();
        assert_eq!(data, &DataBuffer::from(vec!["ab".to_string(), "cd".to_string()]));
        assert!(ds.scalar_info().unwrap().is_text);

        let mut raw = Dataset::scalar();
        raw.config_mut().convert_byte_to_string = false;
        assert!(matches!(raw.read(&mut backend, "/names").unwrap(), DataBuffer::Bytes(_)));
    }

    #[test]
    fn test_reinit_only_resets_selection() {
        let mut backend = backend();
        let mut ds = Dataset::scalar();
        ds.init(&mut backend, "/u8").unwrap();
        ds.selection_mut().unwrap().start_mut()[0] = 1;
        ds.init(&mut backend, "/u8").unwrap();
        assert_eq!(ds.selection().unwrap().start(), &[0, 0]);
        assert_eq!(ds.dims().unwrap(), &[2, 2]);
        assert_eq!(ds.max_dims().unwrap(), &[2, 2]);
        assert_eq!((ds.height().unwrap(), ds.width().unwrap()), (2, 2));
    }

    #[test]
    fn test_open_failure_keeps_state() {
        let mut backend = backend();
        backend.fail_open("/u8");
        let mut ds = Dataset::scalar();
        assert!(ds.init(&mut backend, "/u8").is_err());
        assert_eq!(ds.state(), &InitState::Uninitialized);
    }

    #[test]
    fn test_scalar_dataspace_has_rank_one() {
        let mut backend = MemoryBackend::new();
        backend.add_dataset("/s", "f32", &[], vec![2.5f32]).unwrap();
        let mut ds = Dataset::scalar();
        assert_eq!(ds.read(&mut backend, "/s").unwrap(), &DataBuffer::F32(vec![2.5]));
        assert_eq!(ds.dims().unwrap(), &[1]);
        assert_eq!(ds.rank().unwrap(), 1);
    }

    #[test]
    fn test_image_settings() {
        let mut info = ScalarInfo::default();
        info.set_image_data_range(5.0, 1.0);
        assert_eq!(info.image_data_range(), None);
        info.set_image_data_range(0.0, 10.0);
        assert_eq!(info.image_data_range(), Some((0.0, 10.0)));
        info.add_filtered_image_value(-999.0);
        info.add_filtered_image_value(-999.0);
        assert_eq!(info.filtered_image_values(), &[-999.0]);
    }

    #[test]
    fn test_u64_read_and_written_back_unchanged() {
        let mut backend = MemoryBackend::new();
        backend.add_dataset("/big", "u64", &[2], vec![-1i64, 5]).unwrap();
        let mut ds = Dataset::scalar();
        let data = ds.read(&mut backend, "/big").unwrap().clone();
        assert_eq!(data, DataBuffer::I64(vec![-1, 5]));
        ds.write(&mut backend, "/big", &data).unwrap();
        assert_eq!(backend.values("/big"), Some(&DataBuffer::I64(vec![-1, 5])));
    }

    #[test]
    fn test_compound_unsigned_members_round_trip() {
        let mut backend = MemoryBackend::new();
        backend
            .add_compound_dataset(
                "/c",
                "{a:u8[2], n:u64}",
                &[1],
                vec![vec![-1i8, 2].into(), vec![-1i64].into()],
            )
            .unwrap();
        let mut ds = Dataset::compound();
        let data = ds.read(&mut backend, "/c").unwrap().clone();
        assert_eq!(
            data,
            DataBuffer::Compound(vec![DataBuffer::I16(vec![255, 2]), DataBuffer::I64(vec![-1])])
        );
        ds.write(&mut backend, "/c", &data).unwrap();
        assert_eq!(
            backend.member_values("/c", "a"),
            Some(&DataBuffer::I8(vec![-1, 2]))
        );
        assert_eq!(backend.member_values("/c", "n"), Some(&DataBuffer::I64(vec![-1])));
    }

    #[test]
    fn test_extra_member_buffers_are_rejected() {
        let mut backend = MemoryBackend::new();
        backend
            .add_compound_dataset("/c", "{a:i32, b:f32}", &[1], vec![vec![1i32].into(), vec![0.5f32].into()])
            .unwrap();
        let mut ds = Dataset::compound();
        ds.init(&mut backend, "/c").unwrap();
        ds.members_mut().unwrap().set_all_selected(false);
        ds.members_mut().unwrap().select_member(0);
        let data = DataBuffer::Compound(vec![vec![7i32].into(), vec![1.5f32].into()]);
        let err = ds.write(&mut backend, "/c", &data).unwrap_err();
        assert!(matches!(err, ObjectError::InvalidSelection(_)));
        assert_eq!(backend.member_values("/c", "a"), Some(&DataBuffer::I32(vec![1])));
    }

    #[test]
    fn test_copy_subset_of_compound_is_unsupported() {
        let mut backend = MemoryBackend::new();
        let mut ds = Dataset::compound();
        let err = ds.copy(&mut backend, "/c", "/d", true).unwrap_err();
        assert!(matches!(err, ObjectError::Unsupported { .. }));
    }
}
