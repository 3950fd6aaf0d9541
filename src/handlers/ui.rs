use axum::{
    response::Html,
    routing::get,
    Router,
};

pub fn ui_routes() -> Router {
    Router::new().route("/", get(index_page))
}

/// Single-page chat client. The session travels in the HttpOnly cookie set by
/// /login and /register, so the page never touches the token itself.
pub async fn index_page() -> Html<&'static str> {
    Html(INDEX_HTML)
}

const INDEX_HTML: &str = r###"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>AI Chat Assistant</title>
    <style>
        * { box-sizing: border-box; }
        body { font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif; background: #f4f6fb; margin: 0; color: #1f2937; }
        .container { max-width: 760px; margin: 2rem auto; padding: 0 1rem; }
        .card { background: white; border-radius: 12px; box-shadow: 0 6px 24px rgba(0,0,0,0.08); padding: 1.5rem; margin-bottom: 1rem; }
        h1 { font-size: 1.6rem; margin: 0 0 1rem; }
        input, textarea { width: 100%; padding: 0.7rem; border: 2px solid #e5e7eb; border-radius: 8px; font-size: 1rem; margin-bottom: 0.6rem; }
        button { padding: 0.6rem 1.2rem; border: none; border-radius: 8px; background: #4f46e5; color: white; font-weight: 600; cursor: pointer; }
        button.secondary { background: #6b7280; }
        .row { display: flex; gap: 0.5rem; }
        #messages { height: 420px; overflow-y: auto; display: flex; flex-direction: column; gap: 0.5rem; margin-bottom: 1rem; }
        .msg { padding: 0.6rem 0.9rem; border-radius: 10px; max-width: 80%; white-space: pre-wrap; }
        .user { align-self: flex-end; background: #4f46e5; color: white; }
        .assistant { align-self: flex-start; background: #eef2ff; }
        .error { color: #b91c1c; min-height: 1.2rem; }
        .hidden { display: none; }
    </style>
</head>
<body>
<div class="container">
    <div id="auth" class="card">
        <h1>🤖 AI Chat Assistant</h1>
        <input id="email" type="email" placeholder="Email">
        <input id="password" type="password" placeholder="Password">
        <input id="name" type="text" placeholder="Display name (optional, sign up only)">
        <div class="row">
            <button onclick="authenticate('/login')">Log in</button>
            <button class="secondary" onclick="authenticate('/register')">Sign up</button>
        </div>
        <p id="authError" class="error"></p>
    </div>

    <div id="chat" class="card hidden">
        <div class="row" style="justify-content: space-between; margin-bottom: 1rem;">
            <strong id="greeting"></strong>
            <div class="row">
                <button class="secondary" onclick="clearHistory()">Clear</button>
                <button class="secondary" onclick="location.href='/logout'">Log out</button>
            </div>
        </div>
        <div id="messages"></div>
        <div class="row">
            <textarea id="input" rows="2" placeholder="Type a message..."></textarea>
            <button id="send" onclick="sendMessage()">Send</button>
        </div>
    </div>
</div>
<script>
    const messages = document.getElementById('messages');

    function addMessage(speaker, text) {
        const div = document.createElement('div');
        div.className = 'msg ' + speaker;
        div.textContent = text;
        messages.appendChild(div);
        messages.scrollTop = messages.scrollHeight;
    }

    function showChat(name) {
        document.getElementById('auth').classList.add('hidden');
        document.getElementById('chat').classList.remove('hidden');
        document.getElementById('greeting').textContent = name ? 'Hi, ' + name + '!' : '';
    }

    async function loadHistory() {
        const res = await fetch('/history');
        if (!res.ok) return false;
        messages.innerHTML = '';
        (await res.json()).forEach(turn => addMessage(turn.speaker, turn.text));
        return true;
    }

    async function authenticate(path) {
        const body = {
            email: document.getElementById('email').value,
            password: document.getElementById('password').value,
        };
        const name = document.getElementById('name').value;
        if (path === '/register' && name) body.name = name;

        const res = await fetch(path, {
            method: 'POST',
            headers: { 'Content-Type': 'application/json' },
            body: JSON.stringify(body),
        });
        const data = await res.json();
        if (!res.ok) {
            document.getElementById('authError').textContent = data.message;
            return;
        }
        localStorage.setItem('displayName', data.user.display_name);
        showChat(data.user.display_name);
        await loadHistory();
    }

    async function sendMessage() {
        const input = document.getElementById('input');
        const text = input.value;
        input.value = '';
        addMessage('user', text);
        const button = document.getElementById('send');
        button.disabled = true;
        try {
            const res = await fetch('/chat', {
                method: 'POST',
                headers: { 'Content-Type': 'application/json' },
                body: JSON.stringify({ message: text }),
            });
            if (res.status === 401) { location.reload(); return; }
            addMessage('assistant', (await res.json()).reply);
        } finally {
            button.disabled = false;
        }
    }

    async function clearHistory() {
        await fetch('/history', { method: 'DELETE' });
        messages.innerHTML = '';
    }

    document.getElementById('input').addEventListener('keydown', e => {
        if (e.key === 'Enter' && !e.shiftKey) { e.preventDefault(); sendMessage(); }
    });

    loadHistory().then(ok => { if (ok) showChat(localStorage.getItem('displayName')); });
</script>
</body>
</html>
"###;
