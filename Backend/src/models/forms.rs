// Formulaires multipart/form-data (catalogue, formateurs, profil étudiant).
// Tous les champs texte arrivent en chaîne; les nombres et les listes JSON
// (`videos`, `resources`) sont convertis ici, l'image devient un data URI.

use std::str::FromStr;

use actix_multipart::form::bytes::Bytes;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;

use crate::errors::{AppError, AppResult};
use crate::models::dto::{CourseRequest, InstructorRequest, StudentProfileRequest};
use crate::utils::data_uri::ImageDataUri;

#[derive(MultipartForm)]
pub struct CourseForm {
    pub title: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub level: Option<Text<String>>,
    pub category: Option<Text<String>>,
    pub price: Option<Text<String>>,
    pub instructor: Option<Text<String>>,
    pub lessons: Option<Text<String>>,
    pub duration: Option<Text<String>>,
    /// Tableau JSON `[{video_title, video_url, video_order}]`
    pub videos: Option<Text<String>>,
    /// Tableau JSON `[{resource_title, resource_url, resource_order}]`
    pub resources: Option<Text<String>>,
    pub image: Option<Bytes>,
}

impl CourseForm {
    pub fn into_request(self) -> AppResult<CourseRequest> {
        Ok(CourseRequest {
            title: text(self.title),
            description: text(self.description),
            level: text(self.level),
            category: text(self.category),
            price: number::<Decimal>("price", self.price)?,
            instructor: number("instructor", self.instructor)?,
            lessons: number("lessons", self.lessons)?,
            duration: number("duration", self.duration)?,
            image: image(self.image)?,
            videos: json_list("videos", self.videos)?,
            resources: json_list("resources", self.resources)?,
        })
    }
}

#[derive(MultipartForm)]
pub struct InstructorForm {
    pub name: Option<Text<String>>,
    pub role: Option<Text<String>>,
    pub experience: Option<Text<String>>,
    pub students: Option<Text<String>>,
    pub courses: Option<Text<String>>,
    pub bio: Option<Text<String>>,
    pub image: Option<Bytes>,
}

impl InstructorForm {
    pub fn into_request(self) -> AppResult<InstructorRequest> {
        Ok(InstructorRequest {
            name: text(self.name),
            role: text(self.role),
            experience: number("experience", self.experience)?,
            students: number("students", self.students)?,
            courses: number("courses", self.courses)?,
            bio: text(self.bio),
            image: image(self.image)?,
        })
    }
}

#[derive(MultipartForm)]
pub struct StudentProfileForm {
    pub firstname: Option<Text<String>>,
    pub lastname: Option<Text<String>>,
    #[multipart(rename = "profilePic")]
    pub profile_pic: Option<Bytes>,
}

impl StudentProfileForm {
    pub fn into_request(self) -> AppResult<StudentProfileRequest> {
        Ok(StudentProfileRequest {
            firstname: text(self.firstname),
            lastname: text(self.lastname),
            profile_pic: image(self.profile_pic)?,
        })
    }
}

// Champ vide = champ absent
fn text(field: Option<Text<String>>) -> Option<String> {
    field.map(|t| t.0).filter(|s| !s.trim().is_empty())
}

fn number<T: FromStr>(name: &str, field: Option<Text<String>>) -> AppResult<Option<T>> {
    match text(field) {
        Some(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} must be a number", name))),
        None => Ok(None),
    }
}

fn json_list<T: DeserializeOwned>(name: &str, field: Option<Text<String>>) -> AppResult<Option<Vec<T>>> {
    match text(field) {
        Some(raw) => serde_json::from_str(&raw)
            .map(Some)
            .map_err(|_| AppError::Validation(format!("{} must be a JSON array", name))),
        None => Ok(None),
    }
}

fn image(field: Option<Bytes>) -> AppResult<Option<ImageDataUri>> {
    match field {
        Some(file) if !file.data.is_empty() => {
            let content_type = file.content_type.as_ref().map(|m| m.essence_str());
            ImageDataUri::from_upload(content_type, &file.data).map(Some)
        }
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn field(value: &str) -> Option<Text<String>> {
        Some(Text(value.to_string()))
    }

    #[test]
    fn test_course_form_converts_numbers_and_lists() {
        let form = CourseForm {
            title: field("Rust"),
            description: field(""),
            level: None,
            category: None,
            price: field("49.5"),
            instructor: field(" 3 "),
            lessons: None,
            duration: None,
            videos: field(r#"[{"video_title": "Intro", "video_url": "https://v.test/1"}]"#),
            resources: None,
            image: None,
        };
        let request = form.into_request().unwrap();

        assert_eq!(request.title.as_deref(), Some("Rust"));
        assert!(request.description.is_none());
        assert_eq!(request.price, Some(Decimal::new(495, 1)));
        assert_eq!(request.instructor, Some(3));
        assert_eq!(request.videos.unwrap()[0].video_title.as_deref(), Some("Intro"));
        assert!(request.resources.is_none());
    }

    #[test]
    fn test_bad_number_or_list_is_rejected() {
        assert!(matches!(number::<i32>("lessons", field("ten")), Err(AppError::Validation(_))));
        assert!(matches!(
            json_list::<crate::models::dto::VideoInput>("videos", field("{not json")),
            Err(AppError::Validation(_))
        ));
    }
}
