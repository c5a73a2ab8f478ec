//! Qdrant vector store backend implementation.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    Condition, CreateCollectionBuilder, CreateFieldIndexCollectionBuilder, DeletePointsBuilder,
    Distance, FieldType, Filter, ListValue, PointStruct, SearchPointsBuilder, Struct,
    UpsertPointsBuilder, Value, VectorParamsBuilder,
};
use std::collections::HashMap;

use super::{CollectionInfo, ReadyStep, VectorStore};
use crate::error::VectorStoreError;
use crate::models::{DOCUMENT_FIELD, IndexEntry, SearchHit, VectorStoreConfig};

/// Qdrant vector store backend.
pub struct QdrantBackend {
    client: Qdrant,
    collection: String,
    dimension: u64,
}

impl QdrantBackend {
    pub fn new(config: &VectorStoreConfig, dimension: u64) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
            dimension,
        })
    }

    async fn create_collection(&self) -> Result<(), VectorStoreError> {
        let create_collection = CreateCollectionBuilder::new(&self.collection)
            .vectors_config(VectorParamsBuilder::new(self.dimension, Distance::Cosine));

        match self.client.create_collection(create_collection).await {
            Ok(_) => {
                tracing::debug!(collection = %self.collection, dimension = self.dimension, "created collection");
                Ok(())
            }
            Err(e) => {
                let err = VectorStoreError::CollectionError(e.to_string());
                if err.is_already_exists() { Ok(()) } else { Err(err) }
            }
        }
    }

    async fn create_document_index(&self) -> Result<(), VectorStoreError> {
        let request = CreateFieldIndexCollectionBuilder::new(
            &self.collection,
            DOCUMENT_FIELD,
            FieldType::Keyword,
        )
        .wait(true);

        match self.client.create_field_index(request).await {
            Ok(_) => {
                tracing::debug!(collection = %self.collection, field = DOCUMENT_FIELD, "created keyword index");
                Ok(())
            }
            Err(e) => {
                let err = VectorStoreError::IndexError(e.to_string());
                if err.is_already_exists() { Ok(()) } else { Err(err) }
            }
        }
    }
}

#[async_trait]
impl VectorStore for QdrantBackend {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn collection_info(&self) -> Result<Option<CollectionInfo>, VectorStoreError> {
        let exists = self
            .client
            .collection_exists(&self.collection)
            .await
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;
        if !exists {
            return Ok(None);
        }

        let info = self
            .client
            .collection_info(&self.collection)
            .await
            .map_err(|e| VectorStoreError::CollectionError(e.to_string()))?;

        Ok(Some(info.result.map_or_else(CollectionInfo::default, |r| {
            CollectionInfo {
                points_count: r.points_count.unwrap_or(0),
                has_document_index: r.payload_schema.contains_key(DOCUMENT_FIELD),
            }
        })))
    }

    async fn ensure_ready(&self) -> Result<(), VectorStoreError> {
        match ReadyStep::plan(self.collection_info().await?.as_ref()) {
            ReadyStep::Nothing => Ok(()),
            ReadyStep::CreateIndex => self.create_document_index().await,
            ReadyStep::CreateCollectionAndIndex => {
                self.create_collection().await?;
                self.create_document_index().await
            }
        }
    }

    async fn upsert(&self, entries: Vec<IndexEntry>) -> Result<(), VectorStoreError> {
        if entries.is_empty() {
            return Ok(());
        }

        let points: Vec<PointStruct> = entries
            .into_iter()
            .map(|entry| {
                let payload: HashMap<String, Value> = entry
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, json_to_value(v)))
                    .collect();
                PointStruct::new(entry.id, entry.vector, payload)
            })
            .collect();

        let upsert = UpsertPointsBuilder::new(&self.collection, points).wait(true);

        self.client
            .upsert_points(upsert)
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn search(
        &self,
        vector: Vec<f32>,
        limit: u64,
        document_identifier: Option<&str>,
    ) -> Result<Vec<SearchHit>, VectorStoreError> {
        let mut search_builder =
            SearchPointsBuilder::new(&self.collection, vector, limit).with_payload(true);

        if let Some(id) = document_identifier {
            search_builder = search_builder.filter(Filter::must([Condition::matches(
                DOCUMENT_FIELD,
                id.to_string(),
            )]));
        }

        let results = self
            .client
            .search_points(search_builder)
            .await
            .map_err(|e| VectorStoreError::SearchError(e.to_string()))?;

        Ok(results
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid,
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => {
                        num.to_string()
                    }
                    None => String::new(),
                };
                let payload: serde_json::Map<String, serde_json::Value> = point
                    .payload
                    .into_iter()
                    .map(|(k, v)| (k, value_to_json(v)))
                    .collect();
                SearchHit::from_payload(id, point.score, payload)
            })
            .collect())
    }

    async fn delete_document(&self, document_identifier: &str) -> Result<(), VectorStoreError> {
        if self.collection_info().await?.is_none() {
            return Ok(());
        }

        let filter = Filter::must([Condition::matches(
            DOCUMENT_FIELD,
            document_identifier.to_string(),
        )]);
        let delete = DeletePointsBuilder::new(&self.collection)
            .points(filter)
            .wait(true);

        self.client
            .delete_points(delete)
            .await
            .map_err(|e| VectorStoreError::DeleteError(e.to_string()))?;

        Ok(())
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

fn json_to_value(value: serde_json::Value) -> Value {
    let kind = match value {
        serde_json::Value::Null => Kind::NullValue(0),
        serde_json::Value::Bool(b) => Kind::BoolValue(b),
        serde_json::Value::Number(n) => match n.as_i64() {
            Some(i) => Kind::IntegerValue(i),
            None => Kind::DoubleValue(n.as_f64().unwrap_or_default()),
        },
        serde_json::Value::String(s) => Kind::StringValue(s),
        serde_json::Value::Array(items) => Kind::ListValue(ListValue {
            values: items.into_iter().map(json_to_value).collect(),
        }),
        serde_json::Value::Object(map) => Kind::StructValue(Struct {
            fields: map
                .into_iter()
                .map(|(k, v)| (k, json_to_value(v)))
                .collect(),
        }),
    };
    Value { kind: Some(kind) }
}

fn value_to_json(value: Value) -> serde_json::Value {
    match value.kind {
        None | Some(Kind::NullValue(_)) => serde_json::Value::Null,
        Some(Kind::BoolValue(b)) => b.into(),
        Some(Kind::IntegerValue(i)) => i.into(),
        Some(Kind::DoubleValue(d)) => serde_json::Number::from_f64(d)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        Some(Kind::StringValue(s)) => s.into(),
        Some(Kind::ListValue(list)) => {
            serde_json::Value::Array(list.values.into_iter().map(value_to_json).collect())
        }
        Some(Kind::StructValue(s)) => serde_json::Value::Object(
            s.fields
                .into_iter()
                .map(|(k, v)| (k, value_to_json(v)))
                .collect(),
        ),
    }
}
