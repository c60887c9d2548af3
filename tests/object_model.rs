//! End-to-end behaviour of entities over the in-memory backend.

use anyhow::Result;
use hdf_object::backend::MemoryBackend;
use hdf_object::data::{Attribute, DataBuffer, Entity, InitState, MetadataContainer, ObjectId};
use hdf_object::datatype::parse_type;
use hdf_object::util::{RenderConfig, MEMBER_SEPARATOR};
use hdf_object::ObjectError;

fn qualified(parts: &[&str]) -> String {
    parts.join(&MEMBER_SEPARATOR.to_string())
}

fn weather() -> Result<MemoryBackend> {
    let mut backend = MemoryBackend::new();
    backend.add_group("/obs");
    backend.add_compound_dataset(
        "/obs/station",
        "{id:u16, pos:{lat:f32, lon:f32}, temps:f32[3]}",
        &[2],
        vec![
            vec![-1i16, 7].into(),
            vec![51.5f32, 48.9].into(),
            vec![-0.1f32, 2.35].into(),
            vec![1.0f32, 2.0, 3.0, 4.0, 5.0, 6.0].into(),
        ],
    )?;
    backend.add_dataset("/obs/grid", "i32", &[3, 4], (0..12).collect::<Vec<i32>>())?;
    Ok(backend)
}

#[test]
fn compound_dataset_flattens_and_reads_selected_members() -> Result<()> {
    let mut backend = weather()?;
    let mut station = Entity::discover(&mut backend, "/obs/station")?;
    station.init(&mut backend)?;

    let members = station.as_dataset().and_then(|d| d.members()).expect("compound members");
    assert_eq!(
        members.names(),
        &[
            "id".to_string(),
            qualified(&["pos", "lat"]),
            qualified(&["pos", "lon"]),
            "temps".to_string(),
        ]
    );
    assert_eq!(members.orders(), &[1, 1, 1, 3]);

    {
        let members = station
            .as_dataset_mut()
            .and_then(|d| d.members_mut())
            .expect("compound members");
        members.set_all_selected(false);
        members.select_member(0);
        members.select_member(3);
    }
    let data = station.read(&mut backend)?;
    assert_eq!(
        data,
        &DataBuffer::Compound(vec![
            DataBuffer::I32(vec![65535, 7]),
            DataBuffer::F32(vec![1.0, 2.0, 3.0, 4.0, 5.0, 6.0]),
        ])
    );
    assert_eq!(backend.open_handle_count(), 0);
    Ok(())
}

#[test]
fn reinit_restores_member_selection() -> Result<()> {
    let mut backend = weather()?;
    let mut station = Entity::discover(&mut backend, "/obs/station")?;
    station.init(&mut backend)?;
    station
        .as_dataset_mut()
        .and_then(|d| d.members_mut())
        .expect("compound members")
        .set_all_selected(false);
    station.init(&mut backend)?;
    let dataset = station.as_dataset().expect("dataset");
    assert_eq!(dataset.members().map(|m| m.selected_member_count()), Some(4));
    Ok(())
}

#[test]
fn broken_member_type_does_not_stop_init() -> Result<()> {
    let mut backend = weather()?;
    backend.break_member_type("/obs/station", "pos")?;
    let mut station = Entity::discover(&mut backend, "/obs/station")?;
    station.init(&mut backend)?;
    let members = station.as_dataset().and_then(|d| d.members()).expect("compound members");
    assert_eq!(members.member_count(), 3);
    assert_eq!(members.types()[1], None);
    assert_eq!(members.orders()[1], 0);
    assert_eq!(backend.open_handle_count(), 0);
    Ok(())
}

#[test]
fn failed_open_leaves_entity_untouched() -> Result<()> {
    let mut backend = weather()?;
    let mut grid = Entity::discover(&mut backend, "/obs/grid")?;
    backend.fail_open("/obs/grid");
    let err = grid.read(&mut backend).unwrap_err();
    assert!(matches!(err, ObjectError::Open { .. }));
    let dataset = grid.as_dataset().expect("dataset");
    assert_eq!(dataset.state(), &InitState::Uninitialized);
    assert!(dataset.data().is_none());
    assert_eq!(backend.open_handle_count(), 0);
    Ok(())
}

#[test]
fn selection_changes_apply_after_clearing_data() -> Result<()> {
    let mut backend = weather()?;
    let mut grid = Entity::discover(&mut backend, "/obs/grid")?;
    assert_eq!(grid.read(&mut backend)?.len(), 12);

    let dataset = grid.as_dataset_mut().expect("dataset");
    {
        let selection = dataset.selection_mut()?;
        selection.start_mut().copy_from_slice(&[1, 1]);
        selection.count_mut().copy_from_slice(&[2, 2]);
        selection.stride_mut().copy_from_slice(&[1, 2]);
    }
    assert_eq!(dataset.height()?, 2);
    dataset.clear_data();
    assert_eq!(grid.read(&mut backend)?, &DataBuffer::I32(vec![5, 7, 9, 11]));
    Ok(())
}

#[test]
fn invalid_selection_is_reported_by_read() -> Result<()> {
    let mut backend = weather()?;
    let mut grid = Entity::discover(&mut backend, "/obs/grid")?;
    grid.init(&mut backend)?;
    grid.as_dataset_mut().expect("dataset").selection_mut()?.count_mut()[1] = 9;
    let err = grid.read(&mut backend).unwrap_err();
    assert!(matches!(err, ObjectError::InvalidSelection(_)));
    assert_eq!(backend.open_handle_count(), 0);
    Ok(())
}

#[test]
fn attributes_round_trip_through_the_backend() -> Result<()> {
    let mut backend = weather()?;
    let mut grid = Entity::discover(&mut backend, "/obs/grid")?;

    let (arena, ty) = parse_type("enum<i8>(LOW=0,HIGH=1)")?;
    let mut quality = Attribute::new("quality", arena, ty, Some(vec![3]));
    quality.set_value(vec![0i8, 1, 0]);
    grid.write_metadata(&mut backend, &quality)?;

    let attributes = grid.metadata(&mut backend)?;
    assert_eq!(attributes.len(), 1);
    assert_eq!(attributes[0].parent(), Some("/obs/grid"));
    assert_eq!(attributes[0].to_display_string(&RenderConfig::with_delimiter(",")), "LOW,HIGH,LOW");

    grid.remove_metadata(&mut backend, "quality")?;
    assert!(grid.metadata(&mut backend)?.is_empty());
    assert!(matches!(
        grid.remove_metadata(&mut backend, "quality"),
        Err(ObjectError::NotFound { .. })
    ));
    Ok(())
}

#[test]
fn copies_are_new_objects() -> Result<()> {
    let mut backend = weather()?;
    let mut grid = Entity::discover(&mut backend, "/obs/grid")?;
    let copy = grid.copy(&mut backend, "/obs/grid_copy", false)?;
    assert_ne!(copy, grid);
    assert_eq!(copy.full_name(), "/obs/grid_copy");
    assert_eq!(backend.values("/obs/grid_copy"), backend.values("/obs/grid"));

    let mut station = Entity::discover(&mut backend, "/obs/station")?;
    assert!(matches!(
        station.copy(&mut backend, "/obs/part", true),
        Err(ObjectError::Unsupported { .. })
    ));
    Ok(())
}

#[test]
fn identity_ignores_names() -> Result<()> {
    let mut backend = weather()?;
    let mut a = Entity::discover(&mut backend, "/obs/grid")?;
    let b = Entity::discover(&mut backend, "/obs/grid")?;
    a.rename("renamed")?;
    assert_eq!(a.full_name(), "/obs/renamed");
    assert_eq!(a, b);

    let other = Entity::group("/obs/grid").with_object_id(ObjectId::new(vec![99]));
    assert_ne!(other, b);
    Ok(())
}
