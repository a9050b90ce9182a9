use db::DBService;
use services::points::PointsService;
use utils_jwt::JwtService;

pub mod error;
pub mod http;
pub mod middleware;
pub mod routes;

/// Shared handler state: database service, token signer and the points
/// engine with its injected reward rules.
#[derive(Clone)]
pub struct AppState {
    db: DBService,
    jwt: JwtService,
    points: PointsService,
}

impl AppState {
    pub fn new(db: DBService, jwt: JwtService, points: PointsService) -> Self {
        Self { db, jwt, points }
    }

    pub fn db(&self) -> &DBService {
        &self.db
    }

    pub fn jwt(&self) -> &JwtService {
        &self.jwt
    }

    pub fn points(&self) -> &PointsService {
        &self.points
    }
}
