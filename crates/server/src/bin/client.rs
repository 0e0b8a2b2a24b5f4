use chrono::Utc;
use serde::Serialize;
use serde_json::Value;

use server::auth::{Claims, TokenVerifier};

const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";

#[derive(Serialize)]
struct CreateCommentRequest {
    comment: String,
    rating: i64,
}

// 用法: client <recipe_id> <user_id>
// 令牌用 RECIPES_SECURITY__JWT_SECRET 现场签发
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut args = std::env::args().skip(1);
    let (Some(recipe_id), Some(user_id)) = (args.next(), args.next()) else {
        anyhow::bail!("usage: client <recipe_id> <user_id>");
    };
    let base_url = std::env::var("RECIPES_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.into());
    let secret = std::env::var("RECIPES_SECURITY__JWT_SECRET")
        .unwrap_or_else(|_| server::config::DEV_JWT_SECRET.to_string());

    let token = TokenVerifier::new(&secret).sign(&Claims {
        id: user_id.clone(),
        exp: Some(Utc::now().timestamp() + 600),
        iat: Some(Utc::now().timestamp()),
    })?;
    let client = reqwest::Client::new();
    println!("Starting recipe comments smoke client against {}...", base_url);

    println!("\n[1/5] Posting a comment as {}...", user_id);
    let payload = CreateCommentRequest {
        comment: "Made this last night, the whole family loved it!".to_string(),
        rating: 5,
    };
    let resp = client
        .post(format!("{}/api/recipes/{}/comments", base_url, recipe_id))
        .bearer_auth(&token)
        .json(&payload)
        .send()
        .await?;
    if !resp.status().is_success() {
        println!("   -> ❌ Failed to post: {} {}", resp.status(), resp.text().await?);
        return Ok(());
    }
    let created: Value = resp.json().await?;
    let comment_id = created["comment"]["id"]
        .as_str()
        .ok_or_else(|| anyhow::anyhow!("Missing comment id in response"))?
        .to_string();
    println!("   -> ✅ Created comment {}", comment_id);

    println!("\n[2/5] Liking it...");
    let like: Value = client
        .post(format!("{}/api/comments/{}/like", base_url, comment_id))
        .bearer_auth(&token)
        .send()
        .await?
        .json()
        .await?;
    println!("   -> isLiked={} likeCount={}", like["isLiked"], like["likeCount"]);

    println!("\n[3/5] Editing the rating...");
    let edited: Value = client
        .put(format!("{}/api/comments/{}", base_url, comment_id))
        .bearer_auth(&token)
        .json(&serde_json::json!({ "rating": 4 }))
        .send()
        .await?
        .json()
        .await?;
    println!("   -> isEdited={}", edited["comment"]["isEdited"]);

    println!("\n[4/5] Fetching the first page...");
    let list: Value = client
        .get(format!("{}/api/recipes/{}/comments?page=1&limit=5", base_url, recipe_id))
        .send()
        .await?
        .json()
        .await?;
    for c in list["comments"].as_array().into_iter().flatten() {
        println!(
            "      - [{}] {} ({}★): {}",
            c["createdAt"], c["username"], c["rating"], c["comment"]
        );
    }
    println!("   -> aggregateRating: {}", list["aggregateRating"]);

    println!("\n[5/5] Deleting the comment...");
    let status = client
        .delete(format!("{}/api/comments/{}", base_url, comment_id))
        .bearer_auth(&token)
        .send()
        .await?
        .status();
    println!("   -> {}", status);

    Ok(())
}
