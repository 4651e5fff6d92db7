//! Route table and the authentication guard.
//!
//! The guard only reads the session holder's published snapshot. Callers
//! must run [`crate::session::SessionHandle::initialize`] first, otherwise
//! every protected route redirects to login.

use uuid::Uuid;

use crate::session::SessionSnapshot;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Route {
    Login,
    Register,
    Home,
    Vehicles,
    VehicleCreate,
    VehicleEdit(Uuid),
    FuelRecords,
    FuelRecordCreate,
    FuelRecordEdit(Uuid),
    About,
}

/// Who may visit a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Access {
    RequiresAuth,
    RequiresGuest,
}

/// Outcome of a guard check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Proceed(Route),
    Redirect(Route),
}

impl Route {
    pub fn name(&self) -> &'static str {
        match self {
            Route::Login => "login",
            Route::Register => "register",
            Route::Home => "home",
            Route::Vehicles => "vehicles",
            Route::VehicleCreate => "vehicle-create",
            Route::VehicleEdit(_) => "vehicle-edit",
            Route::FuelRecords => "fuel-records",
            Route::FuelRecordCreate => "fuel-record-create",
            Route::FuelRecordEdit(_) => "fuel-record-edit",
            Route::About => "about",
        }
    }

    pub fn path(&self) -> String {
        match self {
            Route::Login => "/login".to_string(),
            Route::Register => "/register".to_string(),
            Route::Home => "/".to_string(),
            Route::Vehicles => "/vehicles".to_string(),
            Route::VehicleCreate => "/vehicles/create".to_string(),
            Route::VehicleEdit(id) => format!("/vehicles/{}/edit", id),
            Route::FuelRecords => "/fuel-records".to_string(),
            Route::FuelRecordCreate => "/fuel-records/create".to_string(),
            Route::FuelRecordEdit(id) => format!("/fuel-records/{}/edit", id),
            Route::About => "/about".to_string(),
        }
    }

    pub fn access(&self) -> Access {
        match self {
            Route::Login | Route::Register => Access::RequiresGuest,
            _ => Access::RequiresAuth,
        }
    }
}

impl std::fmt::Display for Route {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Decides whether `route` may be shown for the current session.
pub fn guard(route: Route, snapshot: &SessionSnapshot) -> Navigation {
    match (route.access(), snapshot.is_authenticated()) {
        (Access::RequiresAuth, false) => Navigation::Redirect(Route::Login),
        (Access::RequiresGuest, true) => Navigation::Redirect(Route::Home),
        _ => Navigation::Proceed(route),
    }
}
