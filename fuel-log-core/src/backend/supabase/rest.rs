//! PostgREST table access.

use std::fmt;

use async_trait::async_trait;
use reqwest::{Method, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use super::{read_body, read_json, SupabaseClient};
use crate::backend::{BackendError, DataBackend};
use crate::models::{FuelRecord, FuelRecordPayload, NewVehicle, Vehicle, VehicleChanges};

const VEHICLES: &str = "vehicles";
const FUEL_RECORDS: &str = "fuel_records";
/// Fuel record columns plus the owning vehicle's display fields.
const FUEL_RECORD_SELECT: &str = "*,vehicles(name,license_plate)";

/// Media type asking PostgREST for a single object instead of an array.
const SINGLE_OBJECT: &str = "application/vnd.pgrst.object+json";

/// A PostgREST query: table, selected columns, equality filters and ordering.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: &'static str,
    select: String,
    filters: Vec<(String, String)>,
    order: Vec<String>,
}

impl Query {
    pub fn table(table: &'static str) -> Self {
        Self {
            table,
            select: "*".to_string(),
            filters: Vec::new(),
            order: Vec::new(),
        }
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = columns.to_string();
        self
    }

    pub fn eq(mut self, column: &str, value: impl fmt::Display) -> Self {
        self.filters
            .push((column.to_string(), format!("eq.{}", value)));
        self
    }

    /// Adds an ordering term; terms apply in the order they were added.
    pub fn order(mut self, column: &str, ascending: bool) -> Self {
        let direction = if ascending { "asc" } else { "desc" };
        self.order.push(format!("{}.{}", column, direction));
        self
    }

    pub fn table_name(&self) -> &'static str {
        self.table
    }

    /// Query-string parameters for this query.
    pub fn params(&self) -> Vec<(String, String)> {
        let mut params = vec![("select".to_string(), self.select.clone())];
        params.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            params.push(("order".to_string(), self.order.join(",")));
        }
        params
    }
}

impl SupabaseClient {
    fn table_request(&self, method: Method, query: &Query) -> RequestBuilder {
        self.request(method, &self.rest_url(query.table_name()))
            .query(&query.params())
    }

    async fn select_rows<T: DeserializeOwned>(&self, query: &Query) -> Result<Vec<T>, BackendError> {
        let response = self.table_request(Method::GET, query).send().await?;
        read_json(response).await
    }

    /// Inserts (POST) or updates (PATCH) and returns the single affected row.
    async fn write_row<T, B>(&self, method: Method, query: &Query, body: &B) -> Result<T, BackendError>
    where
        T: DeserializeOwned,
        B: Serialize + Sync,
    {
        let response = self
            .table_request(method, query)
            .header("Prefer", "return=representation")
            .header("Accept", SINGLE_OBJECT)
            .json(body)
            .send()
            .await?;
        read_json(response).await
    }

    async fn delete_rows(&self, query: &Query) -> Result<(), BackendError> {
        let response = self.table_request(Method::DELETE, query).send().await?;
        read_body(response).await.map(|_| ())
    }
}

#[async_trait]
impl DataBackend for SupabaseClient {
    async fn list_vehicles(&self) -> Result<Vec<Vehicle>, BackendError> {
        let query = Query::table(VEHICLES).order("created_at", false);
        self.select_rows(&query).await
    }

    async fn insert_vehicle(&self, vehicle: &NewVehicle) -> Result<Vehicle, BackendError> {
        self.write_row(Method::POST, &Query::table(VEHICLES), vehicle)
            .await
    }

    async fn update_vehicle(
        &self,
        id: Uuid,
        changes: &VehicleChanges,
    ) -> Result<Vehicle, BackendError> {
        let query = Query::table(VEHICLES).eq("id", id);
        self.write_row(Method::PATCH, &query, changes).await
    }

    async fn delete_vehicle(&self, id: Uuid) -> Result<(), BackendError> {
        self.delete_rows(&Query::table(VEHICLES).eq("id", id)).await
    }

    async fn list_fuel_records(
        &self,
        vehicle_id: Option<Uuid>,
    ) -> Result<Vec<FuelRecord>, BackendError> {
        let mut query = Query::table(FUEL_RECORDS)
            .select(FUEL_RECORD_SELECT)
            .order("date", false)
            .order("created_at", false);
        if let Some(id) = vehicle_id {
            query = query.eq("vehicle_id", id);
        }
        self.select_rows(&query).await
    }

    async fn insert_fuel_record(
        &self,
        payload: &FuelRecordPayload,
    ) -> Result<FuelRecord, BackendError> {
        let query = Query::table(FUEL_RECORDS).select(FUEL_RECORD_SELECT);
        self.write_row(Method::POST, &query, payload).await
    }

    async fn update_fuel_record(
        &self,
        id: Uuid,
        payload: &FuelRecordPayload,
    ) -> Result<FuelRecord, BackendError> {
        let query = Query::table(FUEL_RECORDS)
            .select(FUEL_RECORD_SELECT)
            .eq("id", id);
        self.write_row(Method::PATCH, &query, payload).await
    }

    async fn delete_fuel_record(&self, id: Uuid) -> Result<(), BackendError> {
        self.delete_rows(&Query::table(FUEL_RECORDS).eq("id", id))
            .await
    }
}
