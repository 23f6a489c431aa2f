use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::shared::frame_ref::faces_data_key;
use crate::shared::region::Region;
use crate::storage::domain::frame_storage::{FrameStorage, StorageError};

use super::faces_positions::FacesPositions;
use super::frame_mapper::FrameMap;

#[derive(Error, Debug)]
pub enum DatasetError {
    #[error("frame dataset for {video_id} unavailable: {source}")]
    Storage {
        video_id: String,
        #[source]
        source: StorageError,
    },
    #[error("frame dataset is malformed: {0}")]
    Malformed(#[source] serde_json::Error),
    #[error("frame dataset cannot be serialized: {0}")]
    Serialize(#[source] serde_json::Error),
}

/// The tracking stage's output: where faces are on every frame.
///
/// Read-only once built and shared by every redaction shard. On the wire
/// both maps are ordered `[key, value]` pair lists:
/// `{"facesPositions": [[1, [{...}]], ...], "mapper": [[1, 1], [2, 1], ...]}`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "DatasetWire", into = "DatasetWire")]
pub struct FrameDataset {
    faces_positions: FacesPositions,
    mapper: FrameMap,
}

#[derive(Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DatasetWire {
    faces_positions: Vec<(u32, Vec<Region>)>,
    mapper: Vec<(u32, u32)>,
}

impl From<DatasetWire> for FrameDataset {
    fn from(wire: DatasetWire) -> Self {
        Self {
            faces_positions: wire.faces_positions.into_iter().collect(),
            mapper: wire.mapper.into_iter().collect(),
        }
    }
}

impl From<FrameDataset> for DatasetWire {
    fn from(dataset: FrameDataset) -> Self {
        Self {
            faces_positions: dataset.faces_positions.into_iter().collect(),
            mapper: dataset.mapper.into_iter().collect(),
        }
    }
}

impl FrameDataset {
    pub fn new(faces_positions: FacesPositions, mapper: FrameMap) -> Self {
        Self {
            faces_positions,
            mapper,
        }
    }

    pub fn faces_positions(&self) -> &FacesPositions {
        &self.faces_positions
    }

    pub fn mapper(&self) -> &FrameMap {
        &self.mapper
    }

    /// Regions to redact on `frame`, or `None` when the frame is unmapped,
    /// mapped to a sample without data, or that sample lists no regions.
    pub fn regions_for(&self, frame: u32) -> Option<&[Region]> {
        let sample = self.mapper.get(&frame)?;
        self.faces_positions
            .get(sample)
            .map(Vec::as_slice)
            .filter(|regions| !regions.is_empty())
    }

    /// Number of frames that will receive at least one region.
    pub fn frames_with_regions(&self) -> usize {
        self.mapper
            .keys()
            .filter(|&&f| self.regions_for(f).is_some())
            .count()
    }

    pub fn to_json(&self) -> Result<String, DatasetError> {
        serde_json::to_string(self).map_err(DatasetError::Serialize)
    }

    pub fn from_json(json: &[u8]) -> Result<Self, DatasetError> {
        serde_json::from_slice(json).map_err(DatasetError::Malformed)
    }

    pub fn store(&self, storage: &dyn FrameStorage, video_id: &str) -> Result<(), DatasetError> {
        let json = self.to_json()?;
        storage
            .put(&faces_data_key(video_id), json.as_bytes())
            .map_err(|source| DatasetError::Storage {
                video_id: video_id.to_string(),
                source,
            })
    }

    pub fn load(storage: &dyn FrameStorage, video_id: &str) -> Result<Self, DatasetError> {
        let bytes = storage
            .get(&faces_data_key(video_id))
            .map_err(|source| DatasetError::Storage {
                video_id: video_id.to_string(),
                source,
            })?;
        Self::from_json(&bytes)
    }
}
