//! Hand-rendered HTML pages.
//!
//! No template engine; pages are assembled with `format!` the same way the JSON
//! payload builders would be, with every piece of user-controlled text escaped.

use axum::http::StatusCode;

use crate::campground::Campground;
use crate::users::User;

use super::state::{Flash, FlashLevel};

pub fn index(campgrounds: &[Campground], viewer: Option<&User>, flash: &[Flash]) -> String {
    let mut items = String::new();
    for campground in campgrounds {
        items.push_str(&format!(
            "<li><a href=\"/campgrounds/{}\">{}</a> <span>{}</span></li>",
            campground.id,
            escape_html(&campground.title),
            escape_html(&campground.location),
        ));
    }
    let list = if items.is_empty() {
        String::from("<p>No campgrounds yet.</p>")
    } else {
        format!("<ul>{items}</ul>")
    };
    let new_link = if viewer.is_some() {
        "<p><a href=\"/campgrounds/new\">Add a campground</a></p>"
    } else {
        "<p><a href=\"/login\">Log in</a> to add a campground.</p>"
    };
    layout(
        "All campgrounds",
        viewer,
        flash,
        &format!("<h1>Campgrounds</h1>{list}{new_link}"),
    )
}

pub fn show(
    campground: &Campground,
    author_name: &str,
    viewer: Option<&User>,
    flash: &[Flash],
) -> String {
    let mut body = format!(
        "<h1>{title}</h1>\
         <img src=\"{image}\" alt=\"{title}\">\
         <p>{location}</p>\
         <p>${price:.2} per night</p>\
         <p>{description}</p>\
         <p>Submitted by {author}</p>",
        title = escape_html(&campground.title),
        image = escape_html(&campground.image),
        location = escape_html(&campground.location),
        price = campground.price,
        description = escape_html(&campground.description),
        author = escape_html(author_name),
    );

    if campground.reviews.is_empty() {
        body.push_str("<p>No reviews yet.</p>");
    } else {
        body.push_str("<h2>Reviews</h2><ul>");
        for review in &campground.reviews {
            body.push_str(&format!(
                "<li><strong>{}</strong> rated {}/5: {}</li>",
                escape_html(&review.author),
                review.rating,
                escape_html(&review.body),
            ));
        }
        body.push_str("</ul>");
    }

    if viewer.is_some_and(|user| user.id == campground.author) {
        body.push_str(&format!(
            "<p><a href=\"/campgrounds/{id}/edit\">Edit</a></p>\
             <form method=\"post\" action=\"/campgrounds/{id}?_method=DELETE\">\
             <button type=\"submit\">Delete</button></form>",
            id = campground.id,
        ));
    }

    layout(&campground.title, viewer, flash, &body)
}

pub fn new_form(viewer: Option<&User>, flash: &[Flash]) -> String {
    let body = format!(
        "<h1>New campground</h1>\
         <form method=\"post\" action=\"/campgrounds\">{}\
         <button type=\"submit\">Create</button></form>",
        campground_fields(None),
    );
    layout("New campground", viewer, flash, &body)
}

pub fn edit_form(campground: &Campground, viewer: Option<&User>, flash: &[Flash]) -> String {
    let body = format!(
        "<h1>Edit {title}</h1>\
         <form method=\"post\" action=\"/campgrounds/{id}?_method=PUT\">{fields}\
         <button type=\"submit\">Save</button></form>",
        title = escape_html(&campground.title),
        id = campground.id,
        fields = campground_fields(Some(campground)),
    );
    layout("Edit campground", viewer, flash, &body)
}

pub fn register_form(flash: &[Flash]) -> String {
    let body = "<h1>Register</h1>\
        <form method=\"post\" action=\"/register\">\
        <label>Username <input name=\"username\"></label>\
        <label>Email <input name=\"email\" type=\"email\"></label>\
        <label>Password <input name=\"password\" type=\"password\"></label>\
        <button type=\"submit\">Register</button></form>\
        <p>Already have an account? <a href=\"/login\">Log in</a></p>";
    layout("Register", None, flash, body)
}

pub fn login_form(flash: &[Flash]) -> String {
    let body = "<h1>Log in</h1>\
        <form method=\"post\" action=\"/login\">\
        <label>Username <input name=\"username\"></label>\
        <label>Password <input name=\"password\" type=\"password\"></label>\
        <button type=\"submit\">Log in</button></form>\
        <p>New here? <a href=\"/register\">Register</a></p>";
    layout("Log in", None, flash, body)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    layout(
        "Something went wrong",
        None,
        &[],
        &format!(
            "<h1>{status}</h1><p>{}</p>\
             <p><a href=\"/campgrounds\">Back to campgrounds</a></p>",
            escape_html(message),
        ),
    )
}

fn campground_fields(existing: Option<&Campground>) -> String {
    let title = existing
        .map(|c| escape_html(&c.title))
        .unwrap_or_default();
    let location = existing
        .map(|c| escape_html(&c.location))
        .unwrap_or_default();
    let price = existing.map(|c| c.price.to_string()).unwrap_or_default();
    let image = existing
        .map(|c| escape_html(&c.image))
        .unwrap_or_default();
    let description = existing
        .map(|c| escape_html(&c.description))
        .unwrap_or_default();
    format!(
        "<label>Title <input name=\"title\" value=\"{title}\"></label>\
         <label>Location <input name=\"location\" value=\"{location}\"></label>\
         <label>Price <input name=\"price\" value=\"{price}\"></label>\
         <label>Image <input name=\"image\" value=\"{image}\"></label>\
         <label>Description <textarea name=\"description\">{description}</textarea></label>"
    )
}

fn layout(title: &str, viewer: Option<&User>, flash: &[Flash], body: &str) -> String {
    let nav = match viewer {
        Some(user) => format!(
            "<a href=\"/campgrounds\">Campgrounds</a> \
             <span>{}</span> <a href=\"/logout\">Log out</a>",
            escape_html(&user.username),
        ),
        None => String::from(
            "<a href=\"/campgrounds\">Campgrounds</a> \
             <a href=\"/login\">Log in</a> <a href=\"/register\">Register</a>",
        ),
    };
    let banners = flash
        .iter()
        .map(|entry| {
            let class = match entry.level {
                FlashLevel::Success => "flash success",
                FlashLevel::Error => "flash error",
            };
            format!(
                "<div class=\"{class}\">{}</div>",
                escape_html(&entry.message)
            )
        })
        .collect::<String>();
    format!(
        "<!doctype html><html><head><meta charset=\"utf-8\">\
         <title>{} | campgrounds</title></head>\
         <body><nav>{nav}</nav>{banners}<main>{body}</main></body></html>",
        escape_html(title),
    )
}

fn escape_html(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for ch in raw.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use uuid::Uuid;

    use crate::campground::{Campground, Review};
    use crate::users::User;

    use super::{escape_html, index, show};

    fn campground(author: Uuid) -> Campground {
        Campground {
            id: Uuid::new_v4(),
            title: String::from("River <Bend>"),
            location: String::from("Bend, OR"),
            price: 25.0,
            image: String::from("https://example.com/a.jpg"),
            description: String::from("quiet & green"),
            author,
            reviews: vec![Review {
                author: String::from("alice"),
                rating: 4,
                body: String::from("nice"),
            }],
        }
    }

    fn user(id: Uuid, username: &str) -> User {
        User {
            id,
            username: String::from(username),
            email: format!("{username}@example.com"),
        }
    }

    #[test]
    fn escape_html_neutralizes_markup() {
        assert_eq!(
            escape_html("<b>\"a\" & 'b'</b>"),
            "&lt;b&gt;&quot;a&quot; &amp; &#39;b&#39;&lt;/b&gt;"
        );
    }

    #[test]
    fn show_escapes_user_text_and_renders_reviews() {
        let author = Uuid::new_v4();
        let page = show(&campground(author), "bob", None, &[]);
        assert!(page.contains("River &lt;Bend&gt;"));
        assert!(page.contains("quiet &amp; green"));
        assert!(page.contains("rated 4/5"));
        assert!(!page.contains("<Bend>"));
    }

    #[test]
    fn show_offers_edit_and_delete_only_to_the_owner() {
        let author = Uuid::new_v4();
        let camp = campground(author);

        let owner_page = show(&camp, "bob", Some(&user(author, "bob")), &[]);
        assert!(owner_page.contains("/edit"));
        assert!(owner_page.contains("_method=DELETE"));

        let other_page = show(&camp, "bob", Some(&user(Uuid::new_v4(), "eve")), &[]);
        assert!(!other_page.contains("/edit"));
        assert!(!other_page.contains("_method=DELETE"));
    }

    #[test]
    fn index_prompts_login_for_anonymous_viewers() {
        let page = index(&[], None, &[]);
        assert!(page.contains("Log in"));
        assert!(!page.contains("/campgrounds/new"));
    }
}
