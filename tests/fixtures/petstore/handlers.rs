//! Pet store handlers.

// docapi: title Pet Store
// docapi: description Sample service documented with docapi
// docapi: version 1.0.0
// docapi: url https://{env}.petstore.example.com/v1
// docapi: urlvar env api deployment environment
// docapi: code 404 {ApiError} resource not found
// docapi: code 500 {ApiError} internal error

use crate::models::{NewPet, Pet, PetStatus};
use axum::extract::{Path, Query};
use axum::Json;

// docapi: route /pets list_pets
// docapi: begin list_pets
// docapi: method GET
// docapi: summary List pets
// docapi: tags pets
// docapi: query limit {i32} maximum number of results
// docapi: query status {PetStatus} filter by status
// docapi: response 200 {[]Pet} the pets
// docapi: response 500
// docapi: end
pub async fn list_pets(Query(filter): Query<Filter>) -> Json<Vec<Pet>> {
    Json(Vec::new())
}

// docapi: route /pets create_pet
// docapi: begin create_pet
// docapi: method POST
// docapi: summary Create a pet
// docapi: tags pets
// docapi: body {NewPet} pet to add
// docapi: response 201 {Pet} created
// docapi: response 500
// docapi: end create_pet
pub async fn create_pet(Json(pet): Json<NewPet>) -> Json<Pet> {
    todo!()
}

// docapi: route /pets/{id} get_pet
// docapi: begin get_pet
// docapi: method GET
// docapi: desc Returns a single pet by id
// docapi: response 200 {Pet} the pet
// docapi: response 404
// docapi: end
pub async fn get_pet(Path(id): Path<i64>) -> Json<Pet> {
    todo!()
}

pub struct Filter {
    pub limit: Option<i32>,
    pub status: Option<PetStatus>,
}
