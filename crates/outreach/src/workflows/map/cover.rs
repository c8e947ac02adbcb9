use super::board::{Attachment, Card, ImageRef};

const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

fn non_empty(value: Option<&String>) -> Option<String> {
    value
        .map(|value| value.trim())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

fn last_image_url(images: Option<&Vec<ImageRef>>) -> Option<String> {
    images
        .and_then(|images| images.last())
        .and_then(|image| non_empty(image.url.as_ref()))
}

fn attachment_url(attachment: &Attachment) -> Option<String> {
    non_empty(attachment.url.as_ref()).or_else(|| last_image_url(attachment.previews.as_ref()))
}

fn is_image(attachment: &Attachment) -> bool {
    let mime = attachment
        .mime_type
        .as_deref()
        .unwrap_or_default()
        .to_lowercase();
    let url = attachment.url.as_deref().unwrap_or_default().to_lowercase();
    mime.starts_with("image") || IMAGE_EXTENSIONS.iter().any(|ext| url.ends_with(ext))
}

/// Best image for a card: explicit cover, largest scaled cover, the cover's
/// attachment, then the first image-like attachment.
pub fn choose_cover_url(card: &Card) -> Option<String> {
    let attachments = card.attachments();

    if let Some(cover) = &card.cover {
        if let Some(url) = non_empty(cover.url.as_ref()) {
            return Some(url);
        }
        if let Some(url) = last_image_url(cover.scaled.as_ref()) {
            return Some(url);
        }
        if let Some(cover_id) = cover.id_attachment.as_deref() {
            if let Some(attachment) = attachments
                .iter()
                .find(|attachment| attachment.id.as_deref() == Some(cover_id))
            {
                return attachment_url(attachment);
            }
        }
    }

    attachments
        .iter()
        .find(|attachment| is_image(attachment))
        .and_then(attachment_url)
}

/// Logo reference written to the map record. Falls back to any image
/// attachment with a direct url, then to a logo service keyed by domain.
pub fn logo_for(card: &Card, domain: &str) -> String {
    choose_cover_url(card)
        .or_else(|| {
            card.attachments()
                .iter()
                .filter(|attachment| is_image(attachment))
                .find_map(|attachment| non_empty(attachment.url.as_ref()))
        })
        .or_else(|| (!domain.is_empty()).then(|| format!("https://logo.clearbit.com/{domain}")))
        .unwrap_or_default()
}
