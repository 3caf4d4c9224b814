use std::{
    fmt::{self, Debug},
    mem::offset_of,
    path::Path,
};

use anyhow::{anyhow, bail, ensure, Context};
use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4, Vec3, Vec4};
use gltf::{buffer, mesh::Mode, Gltf};
use lib_file_storage::FileStorage;
use log::debug;

/// Guards against pathological (or cyclic) node hierarchies.
const MAX_NODE_DEPTH: usize = 256;

#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable, Default, Debug, PartialEq)]
pub struct Vertex {
    /// world position, `w == 1.0`
    pub position: Vec4,
    // ---- 16 byte alignment
    /// normalized world normal, `w == 0.0`
    pub normal: Vec4,
    // ---- 16 byte alignment
    /// linear RGBA: base color factor times vertex color
    pub color: Vec4,
}

impl Vertex {
    const ATTRIBUTES: [wgpu::VertexAttribute; 3] = [
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: offset_of!(Vertex, position) as wgpu::BufferAddress,
            shader_location: 0,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: offset_of!(Vertex, normal) as wgpu::BufferAddress,
            shader_location: 1,
        },
        wgpu::VertexAttribute {
            format: wgpu::VertexFormat::Float32x4,
            offset: offset_of!(Vertex, color) as wgpu::BufferAddress,
            shader_location: 2,
        },
    ];

    pub(crate) fn buffer_layout() -> wgpu::VertexBufferLayout<'static> {
        wgpu::VertexBufferLayout {
            array_stride: size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &Self::ATTRIBUTES,
        }
    }
}

/// A triangle list in world space.
#[derive(Clone, Default, PartialEq)]
pub struct MeshData {
    pub vertices: Vec<Vertex>,
    pub indices: Vec<u32>,
}

/// The flattened default scene of a glTF document, ready for upload.
#[derive(Clone, Default)]
pub struct ModelData {
    pub label: String,
    pub meshes: Vec<MeshData>,
}

impl ModelData {
    #[must_use]
    pub fn vertex_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.vertices.len()).sum()
    }

    #[must_use]
    pub fn triangle_count(&self) -> usize {
        self.meshes.iter().map(|mesh| mesh.indices.len() / 3).sum()
    }
}

impl Debug for ModelData {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter
            .debug_struct("ModelData")
            .field("label", &self.label)
            .field("meshes", &self.meshes.len())
            .field("vertices", &self.vertex_count())
            .field("triangles", &self.triangle_count())
            .finish()
    }
}

/// Reads and parses the model stored at `model_path`.
///
/// Buffers referenced by a relative URI are looked up next to the model in the same storage.
///
/// # Errors
///
/// Fails if the model or one of its buffers cannot be read, or if the content is not a valid glTF document.
pub fn load_model(storage: &dyn FileStorage, model_path: &Path) -> anyhow::Result<ModelData> {
    let content = storage
        .get_content(model_path)
        .with_context(|| format!("failed to read {}", model_path.display()))?;

    parse_model(&content, &model_path.display().to_string(), |uri| {
        let buffer_path = model_path.with_file_name(uri);
        let buffer = storage
            .get_content(&buffer_path)
            .with_context(|| format!("failed to read buffer {}", buffer_path.display()))?;
        Ok(buffer.into_owned())
    })
}

/// Parses a `.glb` container or a `.gltf` JSON document.
///
/// # Errors
///
/// Fails if the document is invalid, a buffer cannot be resolved, or an accessor points outside its buffer.
pub fn parse_model(
    content: &[u8],
    label: &str,
    resolve_uri: impl Fn(&str) -> anyhow::Result<Vec<u8>>,
) -> anyhow::Result<ModelData> {
    let Gltf { document, mut blob } =
        Gltf::from_slice(content).with_context(|| format!("{label} is not a valid glTF file"))?;

    // Load buffers
    let mut buffer_data = Vec::new();
    for buffer in document.buffers() {
        let data = match buffer.source() {
            buffer::Source::Bin => blob.take().ok_or_else(|| {
                anyhow!(
                    "buffer {} refers to a missing binary chunk",
                    buffer.index()
                )
            })?,
            buffer::Source::Uri(uri) => {
                ensure!(
                    !uri.starts_with("data:"),
                    "buffer {} uses an embedded data URI, which is not supported",
                    buffer.index()
                );
                resolve_uri(uri)?
            }
        };
        ensure!(
            data.len() >= buffer.length(),
            "buffer {} is truncated: expected {} bytes, found {}",
            buffer.index(),
            buffer.length(),
            data.len()
        );
        buffer_data.push(data);
    }

    let scene = document
        .default_scene()
        .or_else(|| document.scenes().next())
        .ok_or_else(|| anyhow!("{label} contains no scene"))?;

    let mut meshes = Vec::new();
    for node in scene.nodes() {
        collect_node(&node, Mat4::IDENTITY, 0, &buffer_data, &mut meshes)?;
    }

    Ok(ModelData {
        label: label.to_owned(),
        meshes,
    })
}

fn collect_node(
    node: &gltf::Node<'_>,
    parent_transform: Mat4,
    depth: usize,
    buffer_data: &[Vec<u8>],
    meshes: &mut Vec<MeshData>,
) -> anyhow::Result<()> {
    ensure!(
        depth < MAX_NODE_DEPTH,
        "node hierarchy is deeper than {MAX_NODE_DEPTH} levels"
    );

    let transform = parent_transform * Mat4::from_cols_array_2d(&node.transform().matrix());

    if let Some(mesh) = node.mesh() {
        for primitive in mesh.primitives() {
            if let Some(mesh_data) = read_primitive(&primitive, transform, buffer_data)? {
                meshes.push(mesh_data);
            }
        }
    }

    for child in node.children() {
        collect_node(&child, transform, depth + 1, buffer_data, meshes)?;
    }
    Ok(())
}

fn read_primitive(
    primitive: &gltf::Primitive<'_>,
    transform: Mat4,
    buffer_data: &[Vec<u8>],
) -> anyhow::Result<Option<MeshData>> {
    if primitive.mode() != Mode::Triangles {
        debug!(
            "skipping primitive {} with mode {:?}",
            primitive.index(),
            primitive.mode()
        );
        return Ok(None);
    }

    let reader = primitive.reader(|buffer| buffer_data.get(buffer.index()).map(Vec::as_slice));

    let Some(positions) = reader.read_positions() else {
        debug!("skipping primitive {} without positions", primitive.index());
        return Ok(None);
    };
    let positions = positions
        .map(|position| transform.transform_point3(Vec3::from(position)))
        .collect::<Vec<_>>();

    let mut indices = match reader.read_indices() {
        Some(indices) => indices.into_u32().collect::<Vec<_>>(),
        None => {
            let count = u32::try_from(positions.len()).context("too many vertices")?;
            (0..count).collect()
        }
    };
    if let Some(index) = indices
        .iter()
        .find(|&&index| usize::try_from(index).map_or(true, |index| index >= positions.len()))
    {
        bail!(
            "primitive {} references vertex {index} but has only {} vertices",
            primitive.index(),
            positions.len()
        );
    }
    indices.truncate(indices.len() - indices.len() % 3);

    let normal_matrix = Mat3::from_mat4(transform).inverse().transpose();
    let normals = match reader.read_normals() {
        Some(normals) => normals
            .map(|normal| (normal_matrix * Vec3::from(normal)).normalize_or_zero())
            .collect(),
        None => face_normals(&positions, &indices),
    };

    let colors = reader
        .read_colors(0)
        .map(|colors| colors.into_rgba_f32().map(Vec4::from).collect::<Vec<_>>());
    let base_color = Vec4::from(
        primitive
            .material()
            .pbr_metallic_roughness()
            .base_color_factor(),
    );

    let vertices = positions
        .iter()
        .enumerate()
        .map(|(index, &position)| {
            let normal = normals
                .get(index)
                .copied()
                .filter(|normal| *normal != Vec3::ZERO)
                .unwrap_or(Vec3::Y);
            let color = colors
                .as_ref()
                .and_then(|colors| colors.get(index))
                .map_or(base_color, |color| base_color * *color);

            Vertex {
                position: (position, 1.0).into(),
                normal: (normal, 0.0).into(),
                color,
            }
        })
        .collect();

    Ok(Some(MeshData { vertices, indices }))
}

/// Area-weighted vertex normals for meshes that don't provide any.
fn face_normals(positions: &[Vec3], indices: &[u32]) -> Vec<Vec3> {
    let mut normals = vec![Vec3::ZERO; positions.len()];
    for triangle in indices.chunks_exact(3) {
        let &[first, second, third] = triangle else {
            continue;
        };
        let corners = [first, second, third].map(|index| usize::try_from(index).unwrap_or(usize::MAX));
        let [Some(&a), Some(&b), Some(&c)] = corners.map(|corner| positions.get(corner)) else {
            continue;
        };
        // the cross product's length is twice the triangle's area
        let weighted_normal = (b - a).cross(c - a);
        for corner in corners {
            if let Some(normal) = normals.get_mut(corner) {
                *normal += weighted_normal;
            }
        }
    }
    normals.iter().map(|normal| normal.normalize_or_zero()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use lib_file_storage::StaticStorage;

    const TRIANGLE_BUFFER_LENGTH: usize = 44;

    /// Positions of a unit right triangle followed by `u16` indices, padded to 4 bytes.
    fn triangle_buffer() -> Vec<u8> {
        let positions: [f32; 9] = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let indices: [u16; 3] = [0, 1, 2];

        let mut buffer = Vec::new();
        buffer.extend(positions.iter().flat_map(|value| value.to_le_bytes()));
        buffer.extend(indices.iter().flat_map(|value| value.to_le_bytes()));
        buffer.resize(TRIANGLE_BUFFER_LENGTH, 0);
        buffer
    }

    fn triangle_json(buffer_uri: Option<&str>) -> String {
        let uri = buffer_uri.map_or(String::new(), |uri| format!(r#""uri":"{uri}","#));
        format!(
            r#"{{
                "asset": {{"version": "2.0"}},
                "scene": 0,
                "scenes": [{{"nodes": [0]}}],
                "nodes": [{{"children": [1], "translation": [1.0, 0.0, 0.0]}}, {{"mesh": 0, "scale": [2.0, 2.0, 2.0]}}],
                "meshes": [{{"primitives": [{{"attributes": {{"POSITION": 0}}, "indices": 1, "material": 0}}]}}],
                "materials": [{{"pbrMetallicRoughness": {{"baseColorFactor": [0.5, 0.25, 1.0, 1.0]}}}}],
                "buffers": [{{{uri}"byteLength": {TRIANGLE_BUFFER_LENGTH}}}],
                "bufferViews": [
                    {{"buffer": 0, "byteOffset": 0, "byteLength": 36}},
                    {{"buffer": 0, "byteOffset": 36, "byteLength": 6}}
                ],
                "accessors": [
                    {{"bufferView": 0, "componentType": 5126, "count": 3, "type": "VEC3", "min": [0.0, 0.0, 0.0], "max": [1.0, 1.0, 0.0]}},
                    {{"bufferView": 1, "componentType": 5123, "count": 3, "type": "SCALAR"}}
                ]
            }}"#
        )
    }

    fn glb_chunk(chunk_type: &[u8; 4], mut data: Vec<u8>, padding: u8) -> Vec<u8> {
        while data.len() % 4 != 0 {
            data.push(padding);
        }
        let mut chunk = u32::try_from(data.len()).unwrap().to_le_bytes().to_vec();
        chunk.extend_from_slice(chunk_type);
        chunk.extend(data);
        chunk
    }

    fn glb(json: &str, bin: Option<Vec<u8>>) -> Vec<u8> {
        let mut chunks = glb_chunk(b"JSON", json.as_bytes().to_vec(), b' ');
        if let Some(bin) = bin {
            chunks.extend(glb_chunk(b"BIN\0", bin, 0));
        }

        let mut container = b"glTF".to_vec();
        container.extend(2_u32.to_le_bytes());
        container.extend(u32::try_from(12 + chunks.len()).unwrap().to_le_bytes());
        container.extend(chunks);
        container
    }

    /// A binary glTF container holding a single colored triangle.
    fn triangle_glb() -> Vec<u8> {
        glb(&triangle_json(None), Some(triangle_buffer()))
    }

    fn no_external_buffers(uri: &str) -> anyhow::Result<Vec<u8>> {
        bail!("unexpected buffer request: {uri}")
    }

    #[test]
    fn parses_a_binary_triangle_with_node_transforms() {
        let model = parse_model(&triangle_glb(), "triangle", no_external_buffers).unwrap();

        assert_eq!(model.label, "triangle");
        assert_eq!(model.meshes.len(), 1);
        assert_eq!(model.vertex_count(), 3);
        assert_eq!(model.triangle_count(), 1);

        let mesh = &model.meshes[0];
        assert_eq!(mesh.indices, [0, 1, 2]);

        // scaled by the child node, then translated by the parent
        let positions = mesh
            .vertices
            .iter()
            .map(|vertex| vertex.position)
            .collect::<Vec<_>>();
        assert_eq!(
            positions,
            [
                Vec4::new(1.0, 0.0, 0.0, 1.0),
                Vec4::new(3.0, 0.0, 0.0, 1.0),
                Vec4::new(1.0, 2.0, 0.0, 1.0),
            ]
        );

        for vertex in &mesh.vertices {
            assert!(vertex.normal.abs_diff_eq(Vec4::new(0.0, 0.0, 1.0, 0.0), 1e-6));
            assert_eq!(vertex.color, Vec4::new(0.5, 0.25, 1.0, 1.0));
        }
    }

    #[test]
    fn resolves_external_buffers_through_the_storage() {
        let mut storage = StaticStorage::default();
        storage.store(
            "models/scene.gltf",
            triangle_json(Some("triangle.bin")).into_bytes(),
        );
        storage.store("models/triangle.bin", triangle_buffer());

        let model = load_model(&storage, Path::new("models/scene.gltf")).unwrap();
        assert_eq!(model.label, "models/scene.gltf");
        assert_eq!(model.triangle_count(), 1);
    }

    #[test]
    fn missing_external_buffer_is_an_error() {
        let mut storage = StaticStorage::default();
        storage.store(
            "models/scene.gltf",
            triangle_json(Some("triangle.bin")).into_bytes(),
        );

        let error = load_model(&storage, Path::new("models/scene.gltf")).unwrap_err();
        assert!(
            format!("{error:#}").contains("models/triangle.bin"),
            "{error:#}"
        );
    }

    #[test]
    fn missing_binary_chunk_is_an_error() {
        let content = glb(&triangle_json(None), None);
        let error = parse_model(&content, "broken", no_external_buffers).unwrap_err();
        assert!(error.to_string().contains("binary chunk"), "{error:#}");
    }

    #[test]
    fn garbage_is_not_a_model() {
        let error = parse_model(b"definitely not a model", "garbage", no_external_buffers)
            .unwrap_err();
        assert_eq!(error.to_string(), "garbage is not a valid glTF file");
    }

    #[test]
    fn missing_model_file_names_the_path() {
        let storage = StaticStorage::default();
        let error = load_model(&storage, Path::new("models/model3.glb")).unwrap_err();
        assert_eq!(error.to_string(), "failed to read models/model3.glb");
    }

    #[test]
    fn face_normals_point_away_from_counter_clockwise_faces() {
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Z];
        let normals = face_normals(&positions, &[0, 1, 2]);

        for normal in normals {
            assert_relative_eq!(normal.y, -1.0);
        }
    }
}
